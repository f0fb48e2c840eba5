//! Rate limiting using tower-governor
//!
//! Every route shares a per-IP daily and hourly quota; the endpoints that run
//! the classifiers or call Spotify get an additional per-minute quota each.
//! Governor implements the quotas as GCRA buckets: a quota of `n` per
//! `window` allows a burst of `n` and replenishes one request every
//! `window / n`.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use axum::{
    Json,
    extract::{ConnectInfo, Request},
    http::{
        StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_governor::{GovernorError, key_extractor::KeyExtractor};
use tracing::warn;

/// Requests per day per client, all routes.
pub const GLOBAL_PER_DAY: u32 = 200;

/// Requests per hour per client, all routes.
pub const GLOBAL_PER_HOUR: u32 = 50;

/// Requests per minute per client on `/predict` and on `/recommend`.
pub const HEAVY_PER_MINUTE: u32 = 10;

pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests";

/// A quota of `requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub requests: u32,
    pub window: Duration,
}

impl Quota {
    pub const fn per_day(requests: u32) -> Self {
        Quota {
            requests,
            window: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub const fn per_hour(requests: u32) -> Self {
        Quota {
            requests,
            window: Duration::from_secs(60 * 60),
        }
    }

    pub const fn per_minute(requests: u32) -> Self {
        Quota {
            requests,
            window: Duration::from_secs(60),
        }
    }

    /// Interval after which one more request is allowed.
    pub fn replenish_period(&self) -> Duration {
        self.window / self.requests.max(1)
    }
}

/// Keys requests by peer IP.
///
/// Requests without connection info (in-process calls, tests) share the
/// `0.0.0.0` bucket rather than failing.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

/// Rewrites governor's plain-text 429 into the API's JSON error envelope,
/// keeping the `retry-after` headers.
pub async fn rate_limit_envelope(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    warn!(
        "Rate limit exceeded, retry after {:?}",
        parts.headers.get("retry-after")
    );

    parts.headers.remove(CONTENT_TYPE);
    parts.headers.remove(CONTENT_LENGTH);

    (
        parts,
        Json(json!({ "error": TOO_MANY_REQUESTS_MESSAGE })),
    )
        .into_response()
}
