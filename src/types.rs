use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A Spotify track object. Local files have no id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub album: Album,
}

/// Response of `GET /me/top/tracks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTracksResponse {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: Option<Track>,
}

/// Response of `GET /me/tracks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTracksResponse {
    pub items: Vec<SavedTrack>,
}

/// Spotify audio features object. Popularity lives on the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub tempo: f64,
}

/// Response of `GET /audio-features`. Entries are `null` for tracks the
/// service has no analysis for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub emotion: String,
    pub intent: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub sentence: String,
    pub emotion: String,
    pub intent: String,
    pub context: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    pub text: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub emotion: String,
    pub intent: String,
    pub context: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub artist: String,
    pub url: String,
    pub mood: String,
    pub intent: String,
    pub context: String,
    pub preview_url: Option<String>,
    pub album_art: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendation: Recommendation,
    pub status: String,
}

#[derive(Tabled)]
pub struct ModelTableRow {
    pub model: String,
    pub labels: String,
    pub vocabulary: usize,
    pub iterations: usize,
}
