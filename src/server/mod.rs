//! HTTP server: router, middleware stack and startup.
//!
//! Middleware, outermost first:
//!
//! 1. request tracing
//! 2. CORS
//! 3. security headers
//! 4. panic → 500 envelope
//! 5. 429 → JSON envelope
//! 6. global rate limits (per day, per hour)
//! 7. per-route rate limits on `/predict` and `/recommend`

mod layers;
pub mod rate_limit;
mod state;

pub use layers::{SECURITY_HEADERS, handle_panic};
pub use state::AppState;

use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use thiserror::Error;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    Res, api,
    classifier::{Classifiers, TrainOptions, dataset},
    config::Config,
    spotify::SpotifyClient,
};

use rate_limit::{ClientIpKeyExtractor, GLOBAL_PER_DAY, GLOBAL_PER_HOUR, HEAVY_PER_MINUTE, Quota};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid rate limit quota {0:?}")]
    InvalidQuota(Quota),

    #[error("invalid CORS origin {0:?}")]
    InvalidOrigin(String),
}

/// Builds the application router with its full middleware stack.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Result<Router, ServerError> {
    let limiter = |quota: Quota| {
        GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .period(quota.replenish_period())
            .burst_size(quota.requests)
            .finish()
            .map(Arc::new)
            .ok_or(ServerError::InvalidQuota(quota))
    };

    let predict_limit = limiter(Quota::per_minute(HEAVY_PER_MINUTE))?;
    let recommend_limit = limiter(Quota::per_minute(HEAVY_PER_MINUTE))?;
    let hourly_limit = limiter(Quota::per_hour(GLOBAL_PER_HOUR))?;
    let daily_limit = limiter(Quota::per_day(GLOBAL_PER_DAY))?;

    let app = Router::new()
        .route("/", get(api::home))
        .route("/health", get(api::health))
        .route("/callback", post(api::callback))
        .route(
            "/predict",
            post(api::predict).layer(GovernorLayer::new(predict_limit)),
        )
        .route(
            "/recommend",
            post(api::recommend).layer(GovernorLayer::new(recommend_limit)),
        )
        .fallback(api::not_found)
        .layer(GovernorLayer::new(hourly_limit))
        .layer(GovernorLayer::new(daily_limit))
        .layer(middleware::map_response(rate_limit::rate_limit_envelope))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(layers::security_headers())
        .layer(layers::cors(allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Loads the classifier artifacts from `dir`.
///
/// With `train_if_missing`, absent artifacts are fitted from the built-in
/// dataset and written to `dir` instead of failing startup.
pub async fn load_classifiers(dir: &Path, train_if_missing: bool) -> Res<Classifiers> {
    if train_if_missing && !Classifiers::exist_in(dir) {
        warn!(
            "Classifier artifacts missing in {}, training on the built-in dataset",
            dir.display()
        );
        let classifiers = Classifiers::train(&dataset::sample_dataset(), TrainOptions::default())?;
        classifiers.save(dir).await?;
        return Ok(classifiers);
    }

    let classifiers = Classifiers::load(dir)
        .await
        .map_err(|e| format!("{} (run `moodify train` to create the models)", e))?;
    Ok(classifiers)
}

/// Starts the API server and serves until Ctrl-C.
pub async fn start_api_server(config: Config, train_if_missing: bool) -> Res<()> {
    let classifiers = load_classifiers(&config.models_dir, train_if_missing).await?;
    for (name, classifier) in classifiers.named() {
        info!(
            "Loaded {} classifier: {} labels, {} terms",
            name,
            classifier.labels().len(),
            classifier.vocabulary_len()
        );
    }

    let spotify = SpotifyClient::new(config.spotify.clone(), config.upstream_timeout)?;
    let state = AppState::new(classifiers, Arc::new(spotify));
    let app = build_router(state, &config.allowed_origins)?;

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.server_addr, e))?;
    info!("Moodify API listening on {}", config.server_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
