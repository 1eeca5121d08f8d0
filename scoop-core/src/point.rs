//! Geographic points stored alongside reviews.

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 position in degrees.
///
/// Serialised as `{"latitude": .., "longitude": ..}`, the shape the document
/// store uses for its geographic field. Deserialising applies the same range
/// checks as [`GeoPoint::new`].
///
/// # Examples
/// ```
/// use scoop_core::GeoPoint;
///
/// # fn main() -> Result<(), scoop_core::GeoPointError> {
/// let seoul = GeoPoint::new(37.5665, 126.9780)?;
/// assert_eq!(seoul.latitude, 37.5665);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    /// Degrees north of the equator.
    pub latitude: f64,
    /// Degrees east of the prime meridian.
    pub longitude: f64,
}

/// Errors returned by [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoPointError {
    /// Latitude or longitude was NaN or infinite.
    #[error("coordinates must be finite")]
    NonFinite,
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl GeoPoint {
    /// Validates and constructs a [`GeoPoint`].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoPointError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Render the point as `"longitude,latitude"`, the order map providers
    /// expect in query strings.
    #[must_use]
    pub fn to_lon_lat_string(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Self {
            x: point.longitude,
            y: point.latitude,
        }
    }
}
