//! Tests for the reqwest-backed Spotify client
//!
//! A local axum server stands in for the Spotify accounts service and Web API
//! and records what the client sends.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use moodify::{
    config::{DEFAULT_SPOTIFY_AUTH_URL, DEFAULT_SPOTIFY_SCOPE, SpotifyConfig},
    error::AppError,
    spotify::{SpotifyApi, SpotifyClient, SpotifyError},
};

/// One request as seen by the stand-in server.
#[derive(Debug, Clone)]
struct SeenRequest {
    path: String,
    authorization: Option<String>,
    params: HashMap<String, String>,
}

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<SeenRequest>>,
}

impl Recorder {
    fn record(&self, uri: &Uri, headers: &HeaderMap, params: HashMap<String, String>) {
        self.requests.lock().unwrap().push(SeenRequest {
            path: uri.path().to_string(),
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            params,
        });
    }

    fn requests_to(&self, path: &str) -> Vec<SeenRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

fn track_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "artists": [{ "id": null, "name": format!("Band {}", id) }],
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) },
        "popularity": 42,
        "preview_url": null,
        "album": { "name": "Album", "images": [] }
    })
}

fn expired() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "status": 401, "message": "The access token expired" } })),
    )
        .into_response()
}

async fn token(
    State(recorder): State<Arc<Recorder>>,
    uri: Uri,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let code = form.get("code").cloned().unwrap_or_default();
    recorder.record(&uri, &headers, form);

    if code == "good-code" {
        Json(json!({
            "access_token": "BQC-token",
            "token_type": "Bearer",
            "scope": "user-top-read",
            "expires_in": 3600,
            "refresh_token": "AQD-refresh"
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })),
        )
            .into_response()
    }
}

async fn plain_error() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream down").into_response()
}

async fn top_tracks(
    State(recorder): State<Arc<Recorder>>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    recorder.record(&uri, &headers, params);
    if headers.get(AUTHORIZATION).is_some_and(|v| v == "Bearer expired") {
        return expired();
    }

    Json(json!({ "items": [track_json("T1"), track_json("T2")] })).into_response()
}

async fn saved_tracks(
    State(recorder): State<Arc<Recorder>>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    recorder.record(&uri, &headers, params);

    Json(json!({
        "items": [
            { "added_at": "2024-01-01T00:00:00Z", "track": track_json("S1") },
            { "added_at": "2024-01-02T00:00:00Z", "track": null }
        ]
    }))
    .into_response()
}

/// Answers in request order; ids starting with `local` have no analysis.
async fn audio_features(
    State(recorder): State<Arc<Recorder>>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let ids = params.get("ids").cloned().unwrap_or_default();
    recorder.record(&uri, &headers, params);

    let features: Vec<Value> = ids
        .split(',')
        .map(|id| {
            if id.starts_with("local") {
                Value::Null
            } else {
                json!({
                    "id": id,
                    "valence": 0.5,
                    "energy": 0.6,
                    "danceability": 0.7,
                    "tempo": 120.0,
                    "duration_ms": 200000
                })
            }
        })
        .collect();

    Json(json!({ "audio_features": features })).into_response()
}

/// Test helper: starts the stand-in server
async fn spawn_stand_in() -> (SocketAddr, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let app = Router::new()
        .route("/api/token", post(token))
        .route("/plain/token", post(plain_error))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/v1/me/tracks", get(saved_tracks))
        .route("/v1/audio-features", get(audio_features))
        .with_state(recorder.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    (addr, recorder)
}

/// Test helper: stand-in server plus a client pointed at it
async fn setup() -> (SpotifyClient, Arc<Recorder>) {
    let (addr, recorder) = spawn_stand_in().await;
    (client_for(addr, "/api/token"), recorder)
}

fn client_for(addr: SocketAddr, token_path: &str) -> SpotifyClient {
    let config = SpotifyConfig {
        client_id: "client123".to_string(),
        client_secret: "s3cret".to_string(),
        redirect_uri: "http://localhost:3000/callback".to_string(),
        api_url: format!("http://{}/v1", addr),
        token_url: format!("http://{}{}", addr, token_path),
        auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
        scope: DEFAULT_SPOTIFY_SCOPE.to_string(),
    };
    SpotifyClient::new(config, Duration::from_secs(5)).unwrap()
}

// =============================================================================
// Token exchange
// =============================================================================

#[tokio::test]
async fn test_exchange_code_sends_pkce_form_and_credentials() {
    let (client, recorder) = setup().await;

    let token = client.exchange_code("good-code", "verifier-xyz").await.unwrap();
    assert_eq!(token["access_token"], "BQC-token");
    assert_eq!(token["refresh_token"], "AQD-refresh");
    assert_eq!(token["expires_in"], 3600);

    let seen = recorder.requests_to("/api/token");
    assert_eq!(seen.len(), 1);

    let form = &seen[0].params;
    assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
    assert_eq!(form.get("client_id").map(String::as_str), Some("client123"));
    assert_eq!(form.get("code").map(String::as_str), Some("good-code"));
    assert_eq!(form.get("code_verifier").map(String::as_str), Some("verifier-xyz"));
    assert_eq!(
        form.get("redirect_uri").map(String::as_str),
        Some("http://localhost:3000/callback")
    );

    let expected = format!("Basic {}", STANDARD.encode("client123:s3cret"));
    assert_eq!(seen[0].authorization.as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_exchange_code_rejection_keeps_json_body() {
    let (client, _) = setup().await;

    match client.exchange_code("stale-code", "verifier-xyz").await {
        Err(SpotifyError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body["error"], "invalid_grant");
            assert_eq!(body["error_description"], "Invalid authorization code");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_kept_as_string() {
    let (addr, _) = spawn_stand_in().await;
    let client = client_for(addr, "/plain/token");
    match client.exchange_code("good-code", "verifier-xyz").await {
        Err(SpotifyError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(body, Value::String("upstream down".to_string()));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreadable_error_body_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Announces a 100 byte body, sends five bytes and hangs up
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  content-type: application/json\r\n\
                  content-length: 100\r\n\r\n{\"err",
            )
            .await
            .unwrap();
        socket.shutdown().await.ok();
    });

    let client = client_for(addr, "/api/token");
    match client.top_tracks("user-token", 50).await {
        Err(SpotifyError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            let details = body.as_str().unwrap();
            assert!(details.starts_with("unreadable response body"), "{}", details);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

// =============================================================================
// Library endpoints
// =============================================================================

#[tokio::test]
async fn test_top_tracks_uses_bearer_token_and_limit() {
    let (client, recorder) = setup().await;

    let tracks = client.top_tracks("user-token", 50).await.unwrap();
    let ids: Vec<&str> = tracks.iter().filter_map(|t| t.id.as_deref()).collect();
    assert_eq!(ids, vec!["T1", "T2"]);
    assert_eq!(tracks[0].artists[0].name, "Band T1");
    assert_eq!(tracks[0].popularity, 42);

    let seen = recorder.requests_to("/v1/me/top/tracks");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer user-token"));
    assert_eq!(seen[0].params.get("limit").map(String::as_str), Some("50"));
}

#[tokio::test]
async fn test_page_limit_is_clamped() {
    let (client, recorder) = setup().await;

    client.top_tracks("user-token", 500).await.unwrap();
    client.saved_tracks("user-token", 0).await.unwrap();

    let top = recorder.requests_to("/v1/me/top/tracks");
    assert_eq!(top[0].params.get("limit").map(String::as_str), Some("50"));

    let saved = recorder.requests_to("/v1/me/tracks");
    assert_eq!(saved[0].params.get("limit").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn test_saved_tracks_skip_items_without_track() {
    let (client, recorder) = setup().await;

    let tracks = client.saved_tracks("user-token", 50).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id.as_deref(), Some("S1"));

    let seen = recorder.requests_to("/v1/me/tracks");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer user-token"));
    assert_eq!(seen[0].params.get("limit").map(String::as_str), Some("50"));
}

#[tokio::test]
async fn test_expired_token_maps_to_401() {
    let (client, _) = setup().await;

    let err = client.top_tracks("expired", 50).await.unwrap_err();
    assert!(matches!(&err, SpotifyError::Status { status, .. } if status.as_u16() == 401));

    let app_error = AppError::from(err);
    assert_eq!(app_error.status().as_u16(), 401);
    match app_error {
        AppError::UpstreamAuth { details } => {
            assert_eq!(details, "http status: 401, The access token expired")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_audio_features_line_up_with_ids() {
    let (client, recorder) = setup().await;
    let ids: Vec<String> = ["T1", "local-file", "T2"]
        .iter()
        .map(|id| id.to_string())
        .collect();

    let features = client.audio_features("user-token", &ids).await.unwrap();

    assert_eq!(features.len(), 3);
    assert_eq!(features[0].as_ref().map(|f| f.id.as_str()), Some("T1"));
    assert!(features[1].is_none());
    assert_eq!(features[2].as_ref().map(|f| f.id.as_str()), Some("T2"));
    assert_eq!(features[2].as_ref().map(|f| f.danceability), Some(0.7));

    let seen = recorder.requests_to("/v1/audio-features");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer user-token"));
    assert_eq!(
        seen[0].params.get("ids").map(String::as_str),
        Some("T1,local-file,T2")
    );
}

#[tokio::test]
async fn test_audio_features_are_fetched_in_chunks_of_100() {
    let (client, recorder) = setup().await;
    let ids: Vec<String> = (0..150).map(|i| format!("id{}", i)).collect();

    let features = client.audio_features("user-token", &ids).await.unwrap();

    assert_eq!(features.len(), 150);
    for (id, feature) in ids.iter().zip(&features) {
        assert_eq!(feature.as_ref().map(|f| &f.id), Some(id));
    }

    let seen = recorder.requests_to("/v1/audio-features");
    let sizes: Vec<usize> = seen
        .iter()
        .map(|r| r.params["ids"].split(',').count())
        .collect();
    assert_eq!(sizes, vec![100, 50]);
}
