use axum::{http::StatusCode, response::Json};
use serde_json::{Value, json};

pub const LIVENESS_MESSAGE: &str = "🎧 Moodify API is running!";

pub async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
