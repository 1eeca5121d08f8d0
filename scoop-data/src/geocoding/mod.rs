//! HTTP clients for place search and administrative region lookup.
//!
//! [`KakaoKeywordSearch`] implements [`scoop_core::KeywordSearch`] against the
//! Kakao Local keyword-search API. [`RegionCodeClient`] resolves region codes
//! by name pattern for the sign-up flow.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use scoop_core::{KeywordSearch, KeywordSearchRequest};
//! use scoop_data::geocoding::{KakaoKeywordSearch, KakaoKeywordSearchConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KakaoKeywordSearchConfig::new("rest-api-key")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let search = KakaoKeywordSearch::with_config(config)?;
//!
//! let request = KeywordSearchRequest {
//!     query: "카페".into(),
//!     longitude: "126.9780".into(),
//!     latitude: "37.5665".into(),
//!     radius: 500,
//! };
//! let result = search.search(&request).await?;
//! println!("{} places", result.documents.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::Client;
use scoop_core::KeywordSearchError;
use thiserror::Error;

mod kakao;
mod region;

pub use kakao::{DEFAULT_KEYWORD_SEARCH_URL, KakaoKeywordSearch, KakaoKeywordSearchConfig};
pub use region::{
    DEFAULT_REGION_CODE_URL, RegionCode, RegionCodeClient, RegionCodeClientConfig, RegionCodeError,
    RegionCodeResponse,
};

/// Default user agent for outgoing requests.
pub const DEFAULT_USER_AGENT: &str = "scoop-geocoding/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Failure to construct an HTTP client.
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, ClientBuildError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?)
}

/// Transport-level outcome of a failed request, shared by both clients.
#[derive(Debug)]
enum HttpFailure {
    Timeout { url: String, timeout: Duration },
    Status { url: String, status: u16, message: String },
    Network { url: String, message: String },
}

impl HttpFailure {
    fn classify(error: &reqwest::Error, url: &str, timeout: Duration) -> Self {
        if error.is_timeout() {
            return Self::Timeout {
                url: url.to_owned(),
                timeout,
            };
        }
        if let Some(status) = error.status() {
            return Self::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        Self::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl From<HttpFailure> for KeywordSearchError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Timeout { url, timeout } => Self::timeout(url, timeout),
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

/// Redact all but the last four characters of a credential.
fn redact(secret: &str) -> String {
    let visible: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{visible}")
}
