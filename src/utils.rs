use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::{config::SpotifyConfig, types::Track};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Builds the Spotify authorize URL for the PKCE flow, with every query
/// parameter properly encoded.
pub fn build_authorize_url(config: &SpotifyConfig, code_challenge: &str) -> Result<Url, String> {
    Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("scope", config.scope.as_str()),
        ],
    )
    .map_err(|e| format!("invalid authorize url {}: {}", config.auth_url, e))
}

/// Concatenates track lists and drops duplicates by id, keeping the first
/// occurrence. Tracks without an id (local files) are dropped as well since
/// they cannot be looked up for audio features.
pub fn merge_tracks<I>(lists: I) -> Vec<Track>
where
    I: IntoIterator<Item = Vec<Track>>,
{
    let mut merged: Vec<Track> = lists
        .into_iter()
        .flatten()
        .filter(|track| track.id.as_deref().is_some_and(|id| !id.is_empty()))
        .collect();

    remove_duplicate_tracks(&mut merged);
    merged
}

pub fn remove_duplicate_tracks(tracks: &mut Vec<Track>) {
    let mut seen_ids = HashSet::new();
    tracks.retain(|track| seen_ids.insert(track.id.clone()));
}

/// Returns the trimmed value when it is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
