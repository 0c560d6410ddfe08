use std::env;

use anyhow::Context as _;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use crate::error::LikeError;
use crate::model::{LikeOutcome, LikeResponse};
use crate::region::region_code;

pub const DEFAULT_LIKE_API_URL: &str = "https://likexthug.vercel.app/like";
pub const DEFAULT_LIKE_API_KEY: &str = "GREAT";
pub const DEFAULT_RAPIDAPI_HOST: &str = "free-fire-like1.p.rapidapi.com";

/// Credentials for the RapidAPI-hosted alternate provider.
#[derive(Clone, Debug)]
pub struct RapidApiCredentials {
    pub key: String,
    pub host: String,
}

/// Client for the like service. Holds one connection pool for the process.
#[derive(Clone, Debug)]
pub struct LikeClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl LikeClient {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        rapidapi: Option<RapidApiCredentials>,
    ) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid like service url `{endpoint}`"))?;

        let mut headers = HeaderMap::new();
        if let Some(credentials) = rapidapi {
            headers.insert(
                "x-rapidapi-key",
                HeaderValue::from_str(&credentials.key).context("invalid RAPIDAPI_KEY")?,
            );
            headers.insert(
                "x-rapidapi-host",
                HeaderValue::from_str(&credentials.host).context("invalid RAPIDAPI_HOST")?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build like service http client")?;

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = env_non_empty("LIKE_API_URL")
            .unwrap_or_else(|| DEFAULT_LIKE_API_URL.to_owned());
        let api_key =
            env_non_empty("LIKE_API_KEY").unwrap_or_else(|| DEFAULT_LIKE_API_KEY.to_owned());
        let rapidapi = env_non_empty("RAPIDAPI_KEY").map(|key| RapidApiCredentials {
            key,
            host: env_non_empty("RAPIDAPI_HOST")
                .unwrap_or_else(|| DEFAULT_RAPIDAPI_HOST.to_owned()),
        });

        Self::new(&endpoint, api_key, rapidapi)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request(&self, uid: &str, region_code: &str) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .query(&[
                ("uid", uid),
                ("region", region_code),
                ("key", self.api_key.as_str()),
            ])
            .build()
    }

    /// Ask the service to send likes to `uid`. `region` is the token the user
    /// typed; it is mapped through [`region_code`] before sending.
    pub async fn send_like(&self, uid: &str, region: &str) -> Result<LikeOutcome, LikeError> {
        let code = region_code(region);
        let request = self
            .build_request(uid, code)
            .map_err(LikeError::Transport)?;

        debug!(uid, region_code = code, "sending like request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(LikeError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(uid, region_code = code, %status, "like service returned non-200");
            return Err(LikeError::ServiceUnavailable(status));
        }

        let body = response
            .json::<LikeResponse>()
            .await
            .map_err(LikeError::InvalidBody)?;

        Ok(LikeOutcome::from_response(body, region))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
