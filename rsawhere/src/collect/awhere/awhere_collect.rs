use geojson::FeatureCollection;
use reqwest::blocking::Client;
use serde_json::Value;
use std::env;
use std::fmt;
use url::Url;

use crate::collect::awhere::auth::get_oauth_token;
use crate::collect::awhere::endpoint::{Endpoint, Query};
use crate::collect::awhere::normalize::{clean, records, stamp_target_id};
use crate::collect::global_variables::{
    API_KEY_ENV, API_SECRET_ENV, AWHERE_API_URL, AWHERE_AUTH_URL,
};
use crate::error::{AwhereError, Result};

/// Credentials and service URLs.
#[derive(Clone)]
pub struct AwhereConfig {
    pub api_key: String,
    pub api_secret: String,
    pub api_url: Url,
    pub auth_url: Url,
}

impl AwhereConfig {
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self> {
        Ok(AwhereConfig {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            api_url: Url::parse(AWHERE_API_URL)?,
            auth_url: Url::parse(AWHERE_AUTH_URL)?,
        })
    }

    /// Read the key and secret from `AWHERE_API_KEY` and `AWHERE_API_SECRET`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .map_err(|_| AwhereError::invalid(API_KEY_ENV, "environment variable is not set"))?;
        let api_secret = env::var(API_SECRET_ENV)
            .map_err(|_| AwhereError::invalid(API_SECRET_ENV, "environment variable is not set"))?;
        AwhereConfig::new(&api_key, &api_secret)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        let mut url = Url::parse(api_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.api_url = url;
        Ok(self)
    }

    pub fn with_auth_url(mut self, auth_url: &str) -> Result<Self> {
        self.auth_url = Url::parse(auth_url)?;
        Ok(self)
    }
}

impl fmt::Debug for AwhereConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwhereConfig")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("api_url", &self.api_url.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .finish()
    }
}

/// Source of raw API responses.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<Value>;
}

/// Authenticated aWhere client.
pub struct AwhereCollect {
    client: Client,
    config: AwhereConfig,
    token: String,
}

impl AwhereCollect {
    /// Authenticate against the token endpoint.
    pub fn new(config: AwhereConfig) -> Result<Self> {
        let client = Client::new();
        let token = get_oauth_token(&client, &config)?;
        log::info!("Authenticated against {}", config.auth_url);
        Ok(AwhereCollect {
            client,
            config,
            token,
        })
    }

    /// Use an already issued bearer token.
    pub fn with_token(config: AwhereConfig, token: &str) -> Self {
        AwhereCollect {
            client: Client::new(),
            config,
            token: token.to_string(),
        }
    }

    pub fn config(&self) -> &AwhereConfig {
        &self.config
    }

    /// Request `endpoint` and return its records as point features.
    pub fn get(&self, endpoint: &Endpoint, query: &Query) -> Result<FeatureCollection> {
        collect_table(self, &self.config.api_url, endpoint, query)
    }
}

impl Fetch for AwhereCollect {
    fn fetch(&self, url: &Url) -> Result<Value> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::error!("aWhere API returned {} for {}: {}", status, url, body);
            return Err(AwhereError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json()?)
    }
}

/// Fetch `endpoint` for `query` and normalize the response.
pub fn collect_table<F: Fetch + ?Sized>(
    fetcher: &F,
    api_url: &Url,
    endpoint: &Endpoint,
    query: &Query,
) -> Result<FeatureCollection> {
    let url = endpoint.url(api_url, query)?;
    log::info!("Requesting {}: {}", endpoint.name, url);

    let response = fetcher.fetch(&url)?;
    let mut rows = records(&response, endpoint);
    stamp_target_id(&mut rows, endpoint, &query.target);
    let table = clean(rows, endpoint);
    log::info!("{} records from {}", table.features.len(), endpoint.name);
    Ok(table)
}
