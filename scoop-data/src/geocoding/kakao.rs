//! Kakao Local keyword-search client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Request};
use scoop_core::{KeywordSearch, KeywordSearchError, KeywordSearchRequest, KeywordSearchResult};

use super::{
    ClientBuildError, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpFailure, build_client, redact,
};

/// Production keyword-search endpoint.
pub const DEFAULT_KEYWORD_SEARCH_URL: &str = "https://dapi.kakao.com/v2/local/search/keyword.json";

/// Configuration for [`KakaoKeywordSearch`].
#[derive(Clone)]
pub struct KakaoKeywordSearchConfig {
    /// Endpoint receiving the search parameters.
    pub base_url: String,
    /// REST API key sent as `Authorization: KakaoAK <key>`.
    pub rest_api_key: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl fmt::Debug for KakaoKeywordSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KakaoKeywordSearchConfig")
            .field("base_url", &self.base_url)
            .field("rest_api_key", &redact(&self.rest_api_key))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl KakaoKeywordSearchConfig {
    /// Configuration for the production endpoint with `rest_api_key`.
    #[must_use]
    pub fn new(rest_api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_KEYWORD_SEARCH_URL.to_owned(),
            rest_api_key: rest_api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Point the client at another endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`KeywordSearch`] backed by the Kakao Local API.
///
/// Each search is a single GET with `query`, `x` (longitude), `y`
/// (latitude) and `radius` parameters. Failures surface directly; nothing
/// is retried.
#[derive(Debug)]
pub struct KakaoKeywordSearch {
    client: Client,
    config: KakaoKeywordSearchConfig,
}

impl KakaoKeywordSearch {
    /// Create a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(rest_api_key: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(KakaoKeywordSearchConfig::new(rest_api_key))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: KakaoKeywordSearchConfig) -> Result<Self, ClientBuildError> {
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self { client, config })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &KakaoKeywordSearchConfig {
        &self.config
    }

    /// Assemble the HTTP request for `request` without sending it.
    pub fn build_request(
        &self,
        request: &KeywordSearchRequest,
    ) -> Result<Request, KeywordSearchError> {
        let radius = request.radius.to_string();
        self.client
            .get(&self.config.base_url)
            .query(&[
                ("query", request.query.as_str()),
                ("x", request.longitude.as_str()),
                ("y", request.latitude.as_str()),
                ("radius", radius.as_str()),
            ])
            .header(AUTHORIZATION, format!("KakaoAK {}", self.config.rest_api_key))
            .build()
            .map_err(|err| {
                HttpFailure::classify(&err, &self.config.base_url, self.config.timeout).into()
            })
    }
}

#[async_trait]
impl KeywordSearch for KakaoKeywordSearch {
    async fn search(
        &self,
        request: &KeywordSearchRequest,
    ) -> Result<KeywordSearchResult, KeywordSearchError> {
        let http_request = self.build_request(request)?;
        let url = http_request.url().to_string();
        debug!("event=keyword_search url={url}");

        let classify = |err: reqwest::Error| -> KeywordSearchError {
            HttpFailure::classify(&err, &url, self.config.timeout).into()
        };
        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;

        response
            .json::<KeywordSearchResult>()
            .await
            .map_err(|err| KeywordSearchError::Parse {
                message: err.to_string(),
            })
    }
}
