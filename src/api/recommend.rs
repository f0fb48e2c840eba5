use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
};
use tracing::info;

use crate::{
    api::JsonBody,
    error::{ApiResult, AppError},
    recommend,
    server::AppState,
    types::{RecommendRequest, RecommendResponse},
    utils::non_blank,
};

pub const MISSING_FIELDS_MESSAGE: &str = "Missing access_token or text";

/// Recommends a track for the mood expressed in `text`.
///
/// The access token is read from the body; when the body has none, an
/// `Authorization: Bearer <token>` header is accepted instead.
pub async fn recommend(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<RecommendRequest>,
) -> ApiResult<Json<RecommendResponse>> {
    let token = non_blank(body.access_token.as_deref()).or_else(|| bearer_token(&headers));
    let text = non_blank(body.text.as_deref());

    let (Some(token), Some(text)) = (token, text) else {
        return Err(AppError::validation(MISSING_FIELDS_MESSAGE));
    };

    let labels = state.classifiers.classify(text);
    let recommendation = recommend::recommend(state.spotify.as_ref(), token, &labels).await?;

    info!(
        "Recommended {:?} by {:?} for mood {}",
        recommendation.name, recommendation.artist, recommendation.mood
    );

    Ok(Json(RecommendResponse {
        recommendation,
        status: "success".to_string(),
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") {
        non_blank(Some(token))
    } else {
        None
    }
}
