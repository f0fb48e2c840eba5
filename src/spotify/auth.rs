use reqwest::Client;
use serde_json::Value;

use crate::{
    config::SpotifyConfig,
    spotify::{SpotifyError, check_status},
};

/// Exchanges an authorization code and its PKCE verifier for an access token.
///
/// Posts the form Spotify expects for the authorization code grant to the
/// configured token endpoint. The application credentials travel as HTTP
/// basic auth; the `client_id` form field is kept as well since public PKCE
/// clients identify themselves that way.
///
/// # Returns
///
/// The token endpoint's JSON object, unmodified (`access_token`,
/// `token_type`, `scope`, `expires_in`, `refresh_token`).
///
/// # Errors
///
/// - [`SpotifyError::Status`] when the endpoint rejects the code, with the
///   endpoint's error body (for example `{"error":"invalid_grant", ...}`)
/// - [`SpotifyError::Transport`] for network failures or a non-JSON success
pub async fn exchange_code_pkce(
    client: &Client,
    config: &SpotifyConfig,
    code: &str,
    verifier: &str,
) -> Result<Value, SpotifyError> {
    let response = client
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let response = check_status(response).await?;
    let json: Value = response.json().await?;

    Ok(json)
}
