//! Track scoring and recommendation.
//!
//! The engine merges the user's top and saved tracks, pairs each with its
//! audio features, scores them with a fixed weighted sum and recommends the
//! best one:
//!
//! ```text
//! score = 0.30·valence + 0.20·energy + 0.20·danceability
//!       + 0.15·(tempo / 200) + 0.15·(popularity / 100)
//! ```
//!
//! Tempo is not clipped, so very fast tracks contribute slightly more than
//! their weight.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    error::AppError,
    spotify::{MAX_PAGE_LIMIT, SpotifyApi},
    types::{AudioFeatures, ClassificationResult, Recommendation, Track},
    utils,
};

pub const VALENCE_WEIGHT: f64 = 0.3;
pub const ENERGY_WEIGHT: f64 = 0.2;
pub const DANCEABILITY_WEIGHT: f64 = 0.2;
pub const TEMPO_WEIGHT: f64 = 0.15;
pub const POPULARITY_WEIGHT: f64 = 0.15;

/// Tempo (BPM) mapped to 1.0 before weighting.
pub const TEMPO_SCALE: f64 = 200.0;
/// Popularity mapped to 1.0 before weighting.
pub const POPULARITY_SCALE: f64 = 100.0;

/// The numbers a track is scored on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureVector {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub popularity: f64,
}

impl FeatureVector {
    pub fn new(features: &AudioFeatures, popularity: u32) -> Self {
        FeatureVector {
            valence: features.valence,
            energy: features.energy,
            danceability: features.danceability,
            tempo: features.tempo,
            popularity: f64::from(popularity),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: Track,
    pub score: f64,
}

pub fn score(features: &FeatureVector) -> f64 {
    VALENCE_WEIGHT * features.valence
        + ENERGY_WEIGHT * features.energy
        + DANCEABILITY_WEIGHT * features.danceability
        + (features.tempo / TEMPO_SCALE) * TEMPO_WEIGHT
        + (features.popularity / POPULARITY_SCALE) * POPULARITY_WEIGHT
}

/// Pairs tracks with their audio features and scores them.
///
/// `features` is the audio-features answer for the tracks' ids. Entries are
/// matched by id rather than by position; tracks whose entry is missing or
/// `null` are skipped. Output order follows `tracks`.
pub fn score_tracks(tracks: Vec<Track>, features: Vec<Option<AudioFeatures>>) -> Vec<ScoredTrack> {
    let by_id: HashMap<String, AudioFeatures> = features
        .into_iter()
        .flatten()
        .map(|f| (f.id.clone(), f))
        .collect();

    tracks
        .into_iter()
        .filter_map(|track| {
            let features = by_id.get(track.id.as_deref()?)?;
            let score = score(&FeatureVector::new(features, track.popularity));
            Some(ScoredTrack { track, score })
        })
        .collect()
}

/// Highest scoring track; on ties the earliest one wins.
pub fn select_best(scored: Vec<ScoredTrack>) -> Option<ScoredTrack> {
    scored.into_iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.score <= current.score => Some(current),
        _ => Some(candidate),
    })
}

/// Builds the response body for the chosen track.
pub fn shape(track: &Track, labels: &ClassificationResult) -> Recommendation {
    Recommendation {
        name: track.name.clone(),
        artist: track
            .artists
            .first()
            .map(|artist| artist.name.clone())
            .unwrap_or_default(),
        url: track.external_urls.spotify.clone().unwrap_or_default(),
        mood: labels.emotion.clone(),
        intent: labels.intent.clone(),
        context: labels.context.clone(),
        preview_url: track.preview_url.clone(),
        album_art: track.album.images.first().map(|image| image.url.clone()),
    }
}

/// Recommends one track from the user's library for already classified text.
///
/// Top and saved tracks are fetched concurrently and merged with top tracks
/// first, so a track present in both lists keeps its top-track entry.
///
/// # Errors
///
/// - [`AppError::NoTracks`] when the library is empty or no track has audio
///   features
/// - [`AppError::UpstreamAuth`] / [`AppError::Upstream`] for Spotify failures
pub async fn recommend(
    spotify: &dyn SpotifyApi,
    access_token: &str,
    labels: &ClassificationResult,
) -> Result<Recommendation, AppError> {
    let (top, saved) = tokio::try_join!(
        spotify.top_tracks(access_token, MAX_PAGE_LIMIT),
        spotify.saved_tracks(access_token, MAX_PAGE_LIMIT),
    )?;

    let tracks = utils::merge_tracks([top, saved]);
    if tracks.is_empty() {
        return Err(AppError::NoTracks);
    }

    let ids: Vec<String> = tracks.iter().filter_map(|t| t.id.clone()).collect();
    let features = spotify.audio_features(access_token, &ids).await?;

    let candidates = tracks.len();
    let scored = score_tracks(tracks, features);
    debug!("Scored {} of {} candidate tracks", scored.len(), candidates);

    let best = select_best(scored).ok_or(AppError::NoTracks)?;
    debug!(
        "Recommending {:?} with score {:.4}",
        best.track.name, best.score
    );

    Ok(shape(&best.track, labels))
}
