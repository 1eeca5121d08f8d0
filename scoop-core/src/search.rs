//! Keyword place search port.
//!
//! The response types mirror the Kakao Local keyword-search schema. Numeric
//! fields such as coordinates and distance arrive as strings on the wire and
//! are kept that way; [`Place::coordinate`] parses them on demand.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GeoPoint;

/// A place matched by a keyword search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    /// Provider identifier.
    pub id: String,
    /// Display name.
    pub place_name: String,
    /// Hierarchical category label, e.g. `"음식점 > 카페"`.
    pub category_name: String,
    /// Category group code, e.g. `CE7` for cafes.
    pub category_group_code: String,
    /// Category group label.
    pub category_group_name: String,
    /// Contact number.
    pub phone: String,
    /// Lot-number address.
    pub address_name: String,
    /// Road address.
    pub road_address_name: String,
    /// Longitude in degrees, as a decimal string.
    pub x: String,
    /// Latitude in degrees, as a decimal string.
    pub y: String,
    /// Provider detail page.
    pub place_url: String,
    /// Distance in metres from the search centre, when one was supplied.
    pub distance: String,
}

impl Place {
    /// Parse the place's coordinate.
    ///
    /// Returns `None` when either axis is missing or out of range.
    #[must_use]
    pub fn coordinate(&self) -> Option<GeoPoint> {
        let longitude = self.x.trim().parse().ok()?;
        let latitude = self.y.trim().parse().ok()?;
        GeoPoint::new(latitude, longitude).ok()
    }
}

/// Paging and region metadata returned with a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchMeta {
    /// Total matches known to the provider.
    pub total_count: u32,
    /// Matches reachable through paging.
    pub pageable_count: u32,
    /// Whether the current page is the last.
    pub is_end: bool,
    /// Region analysis of the query, if any.
    pub same_name: Option<SameName>,
}

/// How the provider interpreted region words in the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SameName {
    /// Candidate regions recognised in the query.
    pub region: Vec<String>,
    /// Query with region words removed.
    pub keyword: String,
    /// Region used for the search.
    pub selected_region: String,
}

/// Response of a keyword search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSearchResult {
    /// Matching places.
    #[serde(default)]
    pub documents: Vec<Place>,
    /// Paging metadata.
    #[serde(default)]
    pub meta: SearchMeta,
}

/// Parameters of a keyword search.
///
/// Coordinates are forwarded verbatim as the provider's `x` and `y`
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSearchRequest {
    /// Free-text query.
    pub query: String,
    /// Longitude of the search centre.
    pub longitude: String,
    /// Latitude of the search centre.
    pub latitude: String,
    /// Search radius in metres.
    pub radius: u32,
}

impl KeywordSearchRequest {
    /// Build a request centred on `center`.
    pub fn around(query: impl Into<String>, center: GeoPoint, radius: u32) -> Self {
        Self {
            query: query.into(),
            longitude: center.longitude.to_string(),
            latitude: center.latitude.to_string(),
            radius,
        }
    }
}

/// Errors surfaced by [`KeywordSearch`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeywordSearchError {
    /// The request did not complete within the configured timeout.
    #[error("keyword search to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The provider answered with a non-success status.
    #[error("keyword search to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// The request could not be sent or the response could not be read.
    #[error("keyword search to {url} failed: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The response body did not match the expected schema.
    #[error("failed to parse keyword search response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}

impl KeywordSearchError {
    /// Build a timeout error from a [`Duration`].
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_secs: timeout.as_secs(),
        }
    }
}

/// Keyword search against a place provider.
#[async_trait]
pub trait KeywordSearch: Send + Sync {
    /// Search for places matching `request`.
    async fn search(
        &self,
        request: &KeywordSearchRequest,
    ) -> Result<KeywordSearchResult, KeywordSearchError>;
}
