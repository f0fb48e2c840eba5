//! Configuration management for the Moodify API.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`<data_local_dir>/moodify/.env`)
//! 4. Application defaults (where applicable)
//!
//! The Spotify client id, client secret and redirect URI have no default;
//! [`Config::from_env`] reports every missing one at once so the process can
//! fail fast at startup.

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:5000";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_SCOPE: &str =
    "user-read-private user-read-email user-top-read user-library-read";
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,https://moodify-krish.vercel.app";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Errors raised while assembling a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime configuration of the API server.
#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub spotify: SpotifyConfig,
    pub models_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub upstream_timeout: Duration,
}

/// Spotify application credentials and endpoints.
#[derive(Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub api_url: String,
    pub token_url: String,
    pub auth_url: String,
    pub scope: String,
}

// The client secret must never reach the logs.
impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field("auth_url", &self.auth_url)
            .field("scope", &self.scope)
            .finish()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_addr", &self.server_addr)
            .field("spotify", &self.spotify)
            .field("models_dir", &self.models_dir)
            .field("allowed_origins", &self.allowed_origins)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming every required variable that is
    /// unset or blank, or [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// `from_env` is this function applied to `std::env::var`; tests feed a
    /// map instead of touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |name: &'static str| match get(name) {
            Some(value) => value,
            None => {
                missing.push(name);
                String::new()
            }
        };

        let client_id = required("SPOTIFY_CLIENT_ID");
        let client_secret = required("SPOTIFY_CLIENT_SECRET");
        let redirect_uri = required("SPOTIFY_REDIRECT_URI");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let server_addr = get("SERVER_ADDRESS")
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "SERVER_ADDRESS",
                reason: e.to_string(),
            })?;

        let upstream_timeout = match get("MOODIFY_UPSTREAM_TIMEOUT_SECS") {
            Some(secs) => secs.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "MOODIFY_UPSTREAM_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let allowed_origins = get("MOODIFY_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            server_addr,
            spotify: SpotifyConfig {
                client_id,
                client_secret,
                redirect_uri,
                api_url: get("SPOTIFY_API_URL")
                    .unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string()),
                token_url: get("SPOTIFY_API_TOKEN_URL")
                    .unwrap_or_else(|| DEFAULT_SPOTIFY_TOKEN_URL.to_string()),
                auth_url: get("SPOTIFY_API_AUTH_URL")
                    .unwrap_or_else(|| DEFAULT_SPOTIFY_AUTH_URL.to_string()),
                scope: get("SPOTIFY_API_AUTH_SCOPE")
                    .unwrap_or_else(|| DEFAULT_SPOTIFY_SCOPE.to_string()),
            },
            models_dir: models_dir_from(get("MOODIFY_MODELS_DIR")),
            allowed_origins,
            upstream_timeout: Duration::from_secs(upstream_timeout),
        })
    }
}

/// Loads environment variables from a `.env` file.
///
/// Tries the current working directory first and falls back to
/// `<data_local_dir>/moodify/.env`. A missing file is not an error: the
/// variables may just as well come from the real environment.
///
/// # Example
///
/// ```
/// use moodify::config;
///
/// config::load_env();
/// let config = config::Config::from_env();
/// ```
pub fn load_env() -> Option<PathBuf> {
    if let Ok(path) = dotenv::dotenv() {
        return Some(path);
    }

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("moodify/.env");
    dotenv::from_path(&path).ok().map(|_| path)
}

/// Returns the directory holding the classifier artifacts.
///
/// Reads `MOODIFY_MODELS_DIR`, defaulting to `./models`. Commands that do not
/// need the Spotify credentials (such as `train`) use this instead of a full
/// [`Config`].
pub fn models_dir() -> PathBuf {
    models_dir_from(env::var("MOODIFY_MODELS_DIR").ok().filter(|v| !v.trim().is_empty()))
}

fn models_dir_from(value: Option<String>) -> PathBuf {
    PathBuf::from(value.unwrap_or_else(|| DEFAULT_MODELS_DIR.to_string()))
}

/// Returns the Spotify endpoints and the client id without requiring the full
/// server configuration.
///
/// Used by the `pkce` helper command, which only needs to build an authorize
/// URL. Missing values fall back to the defaults; the client id and redirect
/// URI are required.
pub fn spotify_from_env() -> Result<SpotifyConfig, ConfigError> {
    let get = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let client_id = get("SPOTIFY_CLIENT_ID");
    let redirect_uri = get("SPOTIFY_REDIRECT_URI");

    let (client_id, redirect_uri) = match (client_id, redirect_uri) {
        (Some(id), Some(uri)) => (id, uri),
        (id, uri) => {
            let mut missing = Vec::new();
            if id.is_none() {
                missing.push("SPOTIFY_CLIENT_ID");
            }
            if uri.is_none() {
                missing.push("SPOTIFY_REDIRECT_URI");
            }
            return Err(ConfigError::Missing(missing));
        }
    };

    Ok(SpotifyConfig {
        client_id,
        client_secret: get("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
        redirect_uri,
        api_url: get("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string()),
        token_url: get("SPOTIFY_API_TOKEN_URL")
            .unwrap_or_else(|| DEFAULT_SPOTIFY_TOKEN_URL.to_string()),
        auth_url: get("SPOTIFY_API_AUTH_URL")
            .unwrap_or_else(|| DEFAULT_SPOTIFY_AUTH_URL.to_string()),
        scope: get("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SPOTIFY_SCOPE.to_string()),
    })
}
