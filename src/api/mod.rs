//! # API Module
//!
//! HTTP handlers for the Moodify endpoints.
//!
//! ## Endpoints
//!
//! - [`home`] - `GET /`, plain-text liveness string
//! - [`health`] - `GET /health`, status and version for monitoring
//! - [`callback`] - `POST /callback`, exchanges a PKCE authorization code
//!   for a Spotify token and relays the token endpoint's JSON
//! - [`predict`] - `POST /predict`, classifies text into emotion, intent
//!   and context
//! - [`recommend`] - `POST /recommend`, classifies text and recommends a
//!   track from the user's library
//!
//! Handlers only validate input and translate between HTTP and the
//! [`crate::classifier`], [`crate::recommend`] and [`crate::spotify`]
//! modules. Failures are returned as [`crate::error::AppError`], which renders
//! the JSON error envelope. Rate limits, security headers and panic handling
//! are middleware, see [`crate::server`].

mod callback;
mod health;
mod predict;
mod recommend;

pub use callback::callback;
pub use health::{health, home, not_found};
pub use predict::predict;
pub use recommend::recommend;

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

pub const INVALID_BODY_MESSAGE: &str = "Invalid JSON body";

/// `Json` extractor whose rejection is the API's 400 error envelope instead
/// of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!("Rejected body: {}", describe(&rejection));
                Err(AppError::validation(INVALID_BODY_MESSAGE))
            }
        }
    }
}

fn describe(rejection: &JsonRejection) -> String {
    format!("{} ({})", rejection.body_text(), rejection.status())
}
