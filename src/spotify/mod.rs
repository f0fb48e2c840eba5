//! # Spotify Integration Module
//!
//! This module is the integration layer between Moodify and Spotify's services.
//! It covers the two upstreams the API talks to:
//!
//! ```text
//! HTTP handlers (api)
//!          ↓
//! SpotifyApi trait
//!     ├── Authentication (PKCE authorization code exchange)
//!     └── Library (top tracks, saved tracks, audio features)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Accounts service / Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `POST /api/token` - authorization code exchange ([`auth`])
//! - `GET /me/top/tracks` - the user's top tracks ([`tracks`])
//! - `GET /me/tracks` - the user's saved tracks ([`tracks`])
//! - `GET /audio-features` - batch audio features ([`tracks`])
//!
//! Handlers depend on the [`SpotifyApi`] trait rather than on the concrete
//! [`SpotifyClient`], so the HTTP surface can be exercised without network
//! access.
//!
//! ## Error Types
//!
//! Every call returns [`SpotifyError`]: either the service answered with an
//! error status (the body is kept for diagnostics) or the request never
//! produced a usable response.

pub mod auth;
pub mod tracks;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::SpotifyConfig,
    types::{AudioFeatures, Track},
};

/// Maximum page size Spotify accepts for the library endpoints.
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Maximum number of ids accepted by `GET /audio-features`.
pub const MAX_AUDIO_FEATURES_IDS: usize = 100;

#[derive(Debug, Error)]
pub enum SpotifyError {
    /// The service answered with a non-success status.
    #[error("spotify responded with {status}: {body}")]
    Status { status: StatusCode, body: Value },

    /// Network, timeout or decoding failure.
    #[error("spotify request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Operations the API needs from Spotify.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Exchanges a PKCE authorization code for a token. The JSON object
    /// returned by the token endpoint is passed through untouched.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Value, SpotifyError>;

    /// The user's top tracks, at most `limit` (≤ 50).
    async fn top_tracks(&self, access_token: &str, limit: u32) -> Result<Vec<Track>, SpotifyError>;

    /// The user's saved tracks, at most `limit` (≤ 50).
    async fn saved_tracks(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError>;

    /// Audio features for up to 100 ids, in request order. `None` marks a
    /// track without analysis.
    async fn audio_features(
        &self,
        access_token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, SpotifyError>;
}

/// [`SpotifyApi`] implementation backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(config: SpotifyConfig, timeout: Duration) -> Result<Self, SpotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(SpotifyClient { client, config })
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Value, SpotifyError> {
        auth::exchange_code_pkce(&self.client, &self.config, code, code_verifier).await
    }

    async fn top_tracks(&self, access_token: &str, limit: u32) -> Result<Vec<Track>, SpotifyError> {
        tracks::get_top_tracks(&self.client, &self.config.api_url, access_token, limit).await
    }

    async fn saved_tracks(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        tracks::get_saved_tracks(&self.client, &self.config.api_url, access_token, limit).await
    }

    async fn audio_features(
        &self,
        access_token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, SpotifyError> {
        tracks::get_audio_features(&self.client, &self.config.api_url, access_token, ids).await
    }
}

/// Turns a non-success response into [`SpotifyError::Status`], keeping the
/// body (as JSON when it parses, as a string otherwise). A body that cannot
/// be read is reported as such in place of the body.
pub(crate) async fn check_status(response: Response) -> Result<Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            debug!("Failed to read {} error body: {}", status, e);
            format!("unreadable response body: {}", e)
        }
    };
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

    Err(SpotifyError::Status { status, body })
}
