use std::{collections::HashMap, path::PathBuf, time::Duration};

use moodify::config::{
    Config, ConfigError, DEFAULT_SPOTIFY_API_URL, DEFAULT_SPOTIFY_AUTH_URL, DEFAULT_SPOTIFY_SCOPE,
    DEFAULT_SPOTIFY_TOKEN_URL,
};

// Helper function to build a config from a fixed set of variables
fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|name| vars.get(name).cloned())
}

const REQUIRED: [(&str, &str); 3] = [
    ("SPOTIFY_CLIENT_ID", "client123"),
    ("SPOTIFY_CLIENT_SECRET", "s3cr3t-value"),
    ("SPOTIFY_REDIRECT_URI", "http://localhost:3000/callback"),
];

#[test]
fn test_defaults() {
    let config = config_from(&REQUIRED).unwrap();

    assert_eq!(config.server_addr.to_string(), "0.0.0.0:5000");
    assert_eq!(config.models_dir, PathBuf::from("models"));
    assert_eq!(config.upstream_timeout, Duration::from_secs(10));
    assert_eq!(
        config.allowed_origins,
        vec!["http://localhost:3000", "https://moodify-krish.vercel.app"]
    );

    assert_eq!(config.spotify.client_id, "client123");
    assert_eq!(config.spotify.client_secret, "s3cr3t-value");
    assert_eq!(
        config.spotify.redirect_uri,
        "http://localhost:3000/callback"
    );
    assert_eq!(config.spotify.api_url, DEFAULT_SPOTIFY_API_URL);
    assert_eq!(config.spotify.token_url, DEFAULT_SPOTIFY_TOKEN_URL);
    assert_eq!(config.spotify.auth_url, DEFAULT_SPOTIFY_AUTH_URL);
    assert_eq!(config.spotify.scope, DEFAULT_SPOTIFY_SCOPE);
}

#[test]
fn test_all_missing_variables_reported_at_once() {
    let err = config_from(&[("SPOTIFY_CLIENT_SECRET", "x")]).unwrap_err();

    match err {
        ConfigError::Missing(names) => {
            assert_eq!(names, vec!["SPOTIFY_CLIENT_ID", "SPOTIFY_REDIRECT_URI"])
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_blank_values_count_as_missing() {
    let err = config_from(&[
        ("SPOTIFY_CLIENT_ID", "   "),
        ("SPOTIFY_CLIENT_SECRET", "x"),
        ("SPOTIFY_REDIRECT_URI", "http://localhost/cb"),
    ])
    .unwrap_err();

    assert!(matches!(err, ConfigError::Missing(names) if names == ["SPOTIFY_CLIENT_ID"]));
}

#[test]
fn test_missing_message_names_variables() {
    let err = config_from(&[]).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("SPOTIFY_CLIENT_ID"));
    assert!(message.contains("SPOTIFY_CLIENT_SECRET"));
    assert!(message.contains("SPOTIFY_REDIRECT_URI"));
}

#[test]
fn test_overrides() {
    let mut vars = REQUIRED.to_vec();
    vars.extend([
        ("SERVER_ADDRESS", "127.0.0.1:8080"),
        ("SPOTIFY_API_URL", "http://localhost:9999/v1"),
        ("MOODIFY_MODELS_DIR", "/var/lib/moodify"),
        ("MOODIFY_UPSTREAM_TIMEOUT_SECS", "3"),
        (
            "MOODIFY_ALLOWED_ORIGINS",
            " https://a.example/ , ,https://b.example",
        ),
    ]);

    let config = config_from(&vars).unwrap();

    assert_eq!(config.server_addr.to_string(), "127.0.0.1:8080");
    assert_eq!(config.spotify.api_url, "http://localhost:9999/v1");
    assert_eq!(config.models_dir, PathBuf::from("/var/lib/moodify"));
    assert_eq!(config.upstream_timeout, Duration::from_secs(3));
    // Trimmed, trailing slash removed, empty entries dropped
    assert_eq!(
        config.allowed_origins,
        vec!["https://a.example", "https://b.example"]
    );
}

#[test]
fn test_invalid_values() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("SERVER_ADDRESS", "not-an-address"));
    assert!(matches!(
        config_from(&vars),
        Err(ConfigError::Invalid {
            name: "SERVER_ADDRESS",
            ..
        })
    ));

    let mut vars = REQUIRED.to_vec();
    vars.push(("MOODIFY_UPSTREAM_TIMEOUT_SECS", "ten"));
    assert!(matches!(
        config_from(&vars),
        Err(ConfigError::Invalid {
            name: "MOODIFY_UPSTREAM_TIMEOUT_SECS",
            ..
        })
    ));
}

#[test]
fn test_debug_output_redacts_client_secret() {
    let config = config_from(&REQUIRED).unwrap();
    let debug = format!("{:?}", config);

    assert!(debug.contains("client123"));
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("s3cr3t-value"));
}
