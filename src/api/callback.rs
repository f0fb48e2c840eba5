use axum::{Json, extract::State};
use serde_json::Value;
use tracing::info;

use crate::{
    api::JsonBody,
    error::{ApiResult, AppError},
    server::AppState,
    spotify::SpotifyError,
    types::CallbackRequest,
    utils::non_blank,
};

pub const MISSING_CODE_MESSAGE: &str = "Missing code or code_verifier";

/// Exchanges the authorization code the frontend received from Spotify,
/// together with its PKCE verifier, for an access token.
pub async fn callback(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CallbackRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(code), Some(verifier)) = (
        non_blank(body.code.as_deref()),
        non_blank(body.code_verifier.as_deref()),
    ) else {
        return Err(AppError::validation(MISSING_CODE_MESSAGE));
    };

    match state.spotify.exchange_code(code, verifier).await {
        Ok(token) => {
            info!("Authorization code exchanged");
            Ok(Json(token))
        }
        Err(SpotifyError::Status { body, .. }) => Err(AppError::TokenExchange { details: body }),
        Err(e) => Err(AppError::Upstream(format!("token exchange: {}", e))),
    }
}
