use reqwest::Client;

use crate::{
    spotify::{MAX_AUDIO_FEATURES_IDS, MAX_PAGE_LIMIT, SpotifyError, check_status},
    types::{AudioFeatures, AudioFeaturesResponse, SavedTracksResponse, TopTracksResponse, Track},
};

/// Retrieves the user's top tracks (`GET /me/top/tracks`).
///
/// Requires the `user-top-read` scope. `limit` is clamped to 1..=50.
pub async fn get_top_tracks(
    client: &Client,
    api_url: &str,
    token: &str,
    limit: u32,
) -> Result<Vec<Track>, SpotifyError> {
    let api_url = format!(
        "{uri}/me/top/tracks?limit={limit}",
        uri = api_url,
        limit = limit.clamp(1, MAX_PAGE_LIMIT)
    );

    let response = client.get(&api_url).bearer_auth(token).send().await?;
    let json = check_status(response)
        .await?
        .json::<TopTracksResponse>()
        .await?;

    Ok(json.items)
}

/// Retrieves the user's saved ("liked") tracks (`GET /me/tracks`).
///
/// Requires the `user-library-read` scope. Items without a track object are
/// dropped.
pub async fn get_saved_tracks(
    client: &Client,
    api_url: &str,
    token: &str,
    limit: u32,
) -> Result<Vec<Track>, SpotifyError> {
    let api_url = format!(
        "{uri}/me/tracks?limit={limit}",
        uri = api_url,
        limit = limit.clamp(1, MAX_PAGE_LIMIT)
    );

    let response = client.get(&api_url).bearer_auth(token).send().await?;
    let json = check_status(response)
        .await?
        .json::<SavedTracksResponse>()
        .await?;

    Ok(json.items.into_iter().filter_map(|item| item.track).collect())
}

/// Retrieves audio features for several tracks (`GET /audio-features`).
///
/// Spotify accepts at most 100 ids per request; larger inputs are fetched in
/// chunks and concatenated, so the output always lines up with `ids`.
pub async fn get_audio_features(
    client: &Client,
    api_url: &str,
    token: &str,
    ids: &[String],
) -> Result<Vec<Option<AudioFeatures>>, SpotifyError> {
    let mut features = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(MAX_AUDIO_FEATURES_IDS) {
        let api_url = format!(
            "{url}/audio-features?ids={ids}",
            url = api_url,
            ids = chunk.join(",")
        );

        let response = client.get(&api_url).bearer_auth(token).send().await?;
        let json = check_status(response)
            .await?
            .json::<AudioFeaturesResponse>()
            .await?;

        features.extend(json.audio_features);
    }

    Ok(features)
}
