//! Administrative region code lookup.
//!
//! Sign-up asks the user for a neighbourhood; the region-code service turns a
//! name pattern such as `서울특별시 *` into the matching legal-district codes.

use std::time::Duration;

use log::debug;
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ClientBuildError, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpFailure, build_client};

/// Public region-code endpoint.
pub const DEFAULT_REGION_CODE_URL: &str =
    "https://grpc-proxy-server-mkvo6j4wsq-du.a.run.app/v1/regcodes";

/// One administrative region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCode {
    /// Ten-digit legal-district code.
    pub code: String,
    /// Full region name.
    pub name: String,
}

/// Regions matching a lookup pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCodeResponse {
    /// Matching regions in service order.
    pub regcodes: Vec<RegionCode>,
}

/// Errors returned by [`RegionCodeClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionCodeError {
    /// The request did not complete within the configured timeout.
    #[error("region lookup to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("region lookup to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// The request could not be sent or the response could not be read.
    #[error("region lookup to {url} failed: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The response body did not match the expected schema.
    #[error("failed to parse region lookup response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}

impl From<HttpFailure> for RegionCodeError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Timeout { url, timeout } => Self::Timeout {
                url,
                timeout_secs: timeout.as_secs(),
            },
            HttpFailure::Status {
                url,
                status,
                message,
            } => Self::Http {
                url,
                status,
                message,
            },
            HttpFailure::Network { url, message } => Self::Network { url, message },
        }
    }
}

/// Configuration for [`RegionCodeClient`].
#[derive(Debug, Clone)]
pub struct RegionCodeClientConfig {
    /// Endpoint receiving the `regcode_pattern` parameter.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for RegionCodeClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_CODE_URL)
    }
}

impl RegionCodeClientConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
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

/// Client for the region-code service.
#[derive(Debug)]
pub struct RegionCodeClient {
    client: Client,
    config: RegionCodeClientConfig,
}

impl RegionCodeClient {
    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: RegionCodeClientConfig) -> Result<Self, ClientBuildError> {
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self { client, config })
    }

    /// Assemble the lookup request for `pattern` without sending it.
    pub fn build_request(&self, pattern: &str) -> Result<Request, RegionCodeError> {
        self.client
            .get(&self.config.base_url)
            .query(&[("regcode_pattern", pattern)])
            .build()
            .map_err(|err| {
                HttpFailure::classify(&err, &self.config.base_url, self.config.timeout).into()
            })
    }

    /// Regions whose names match `pattern` (`*` is a wildcard).
    pub async fn region_codes(&self, pattern: &str) -> Result<RegionCodeResponse, RegionCodeError> {
        let request = self.build_request(pattern)?;
        let url = request.url().to_string();
        debug!("event=region_lookup url={url}");

        let classify = |err: reqwest::Error| -> RegionCodeError {
            HttpFailure::classify(&err, &url, self.config.timeout).into()
        };
        let response = self
            .client
            .execute(request)
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;

        response
            .json::<RegionCodeResponse>()
            .await
            .map_err(|err| RegionCodeError::Parse {
                message: err.to_string(),
            })
    }
}
