use axum::{Json, extract::State};

use crate::{
    api::JsonBody,
    error::{ApiResult, AppError},
    server::AppState,
    types::{PredictRequest, PredictResponse},
    utils::non_blank,
};

pub const MISSING_TEXT_MESSAGE: &str = "Missing input";

pub async fn predict(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PredictRequest>,
) -> ApiResult<Json<PredictResponse>> {
    let text = non_blank(body.text.as_deref())
        .ok_or_else(|| AppError::validation(MISSING_TEXT_MESSAGE))?;

    let labels = state.classifiers.classify(text);

    Ok(Json(PredictResponse {
        emotion: labels.emotion,
        intent: labels.intent,
        context: labels.context,
        status: "success".to_string(),
    }))
}
