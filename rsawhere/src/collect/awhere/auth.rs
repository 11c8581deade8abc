use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::collect::awhere::awhere_collect::AwhereConfig;
use crate::error::{AwhereError, Result};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchange the API key and secret for an OAuth bearer token
/// (client-credentials grant).
pub fn get_oauth_token(client: &Client, config: &AwhereConfig) -> Result<String> {
    let response = client
        .post(config.auth_url.clone())
        .basic_auth(&config.api_key, Some(&config.api_secret))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("grant_type=client_credentials")
        .send()?;

    let status = response.status();
    if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    ) {
        return Err(AwhereError::InvalidCredentials);
    }
    if !status.is_success() {
        return Err(AwhereError::Api {
            status: status.as_u16(),
            url: config.auth_url.to_string(),
        });
    }

    let token: TokenResponse = response.json()?;
    token
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(AwhereError::InvalidCredentials)
}

/// Whether the key and secret are accepted by the token endpoint.
///
/// Transport failures are logged and reported as `false`.
pub fn valid_credentials(config: &AwhereConfig) -> bool {
    match get_oauth_token(&Client::new(), config) {
        Ok(_) => true,
        Err(AwhereError::InvalidCredentials) => false,
        Err(err) => {
            log::warn!("Could not validate aWhere credentials: {}", err);
            false
        }
    }
}
