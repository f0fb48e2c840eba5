//! Error types for the Moodify API
//!
//! Handlers return [`AppError`], which renders as the JSON envelope
//! `{"error": <message>, "details": <optional>}`. Validation failures are
//! expected traffic and only logged at debug level; upstream and internal
//! failures are logged with their detail, and internal detail never leaves
//! the process.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{classifier::ClassifierError, spotify::SpotifyError};

pub const NO_TRACKS_MESSAGE: &str = "No tracks found for recommendations";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// The user's library yielded nothing to recommend (400)
    #[error("No tracks found for recommendations")]
    NoTracks,

    /// The token endpoint rejected the authorization code (400)
    #[error("Token exchange failed: {details}")]
    TokenExchange { details: Value },

    /// The music service rejected the request (401)
    #[error("Spotify access failed: {details}")]
    UpstreamAuth { details: String },

    /// Transport or decoding failure talking to Spotify (500)
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// Anything else (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::NoTracks | AppError::TokenExchange { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamAuth { .. } => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors from the music service. Any HTTP error status the service answers
/// with is an access failure from the caller's point of view.
impl From<SpotifyError> for AppError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Status { status, body } => AppError::UpstreamAuth {
                details: format!("http status: {}, {}", status.as_u16(), body_message(&body)),
            },
            SpotifyError::Transport(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(msg) => {
                debug!("Rejected request: {}", msg);
                json!({ "error": msg })
            }
            AppError::NoTracks => {
                debug!("No tracks available for recommendation");
                json!({ "error": NO_TRACKS_MESSAGE })
            }
            AppError::TokenExchange { details } => {
                warn!("Token exchange failed: {}", details);
                json!({ "error": "Token exchange failed", "details": details })
            }
            AppError::UpstreamAuth { details } => {
                warn!("Spotify access failed: {}", details);
                json!({ "error": "Spotify access failed", "details": details })
            }
            AppError::Upstream(detail) | AppError::Internal(detail) => {
                error!("Request failed: {}", detail);
                json!({ "error": INTERNAL_ERROR_MESSAGE })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Extracts Spotify's `error.message` (or `error_description`) from an error
/// body, falling back to the raw body.
fn body_message(body: &Value) -> String {
    match body {
        Value::Object(map) => map
            .get("error")
            .and_then(|e| match e {
                Value::Object(inner) => inner.get("message").and_then(Value::as_str),
                Value::String(s) => map
                    .get("error_description")
                    .and_then(Value::as_str)
                    .or(Some(s.as_str())),
                _ => None,
            })
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, AppError>;
