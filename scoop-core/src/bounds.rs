//! Convert a centre point and search radius into a latitude/longitude box.
//!
//! The conversion uses the local flat-earth approximation: one degree of
//! latitude spans 110.574 km everywhere, and one degree of longitude spans
//! 111.32 km scaled by the cosine of the latitude. The longitude span shrinks
//! towards zero at the poles, so centres beyond [`MAX_CENTER_LATITUDE`] are
//! rejected rather than producing a box that wraps the globe.
//!
//! Radii that would carry a latitude edge past a pole are rejected. Longitude
//! edges that would cross the antimeridian are clamped to ±180, so the box
//! never wraps and posts just across the date line fall outside it.

use geo::{Contains, Coord, Rect};
use thiserror::Error;

use crate::{GeoPoint, GeoPointError};

/// Kilometres spanned by one degree of latitude.
pub const KM_PER_DEGREE_LATITUDE: f64 = 110.574;

/// Kilometres spanned by one degree of longitude at the equator.
pub const KM_PER_DEGREE_LONGITUDE_AT_EQUATOR: f64 = 111.32;

/// Largest absolute centre latitude accepted by [`CoordinateBoundingBox::around`].
pub const MAX_CENTER_LATITUDE: f64 = 85.0;

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

/// Errors returned by [`CoordinateBoundingBox::around`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoundingBoxError {
    /// The radius was zero or negative.
    #[error("search radius must be positive, got {0} km")]
    NonPositiveRadius(f64),
    /// The radius was NaN or infinite.
    #[error("search radius must be finite")]
    NonFiniteRadius,
    /// The centre is too close to a pole for the longitude approximation.
    #[error("centre latitude {latitude} exceeds the supported bound of ±{max}")]
    LatitudeOutOfRange {
        /// Rejected centre latitude.
        latitude: f64,
        /// Largest supported absolute latitude.
        max: f64,
    },
    /// The radius would push the box past a pole.
    #[error("search radius {radius_km} km around latitude {latitude} reaches past a pole")]
    RadiusTooLarge {
        /// Rejected radius.
        radius_km: f64,
        /// Centre latitude.
        latitude: f64,
    },
    /// A computed corner is not a valid coordinate.
    #[error("bounding box corner is invalid: {0}")]
    InvalidCorner(#[from] GeoPointError),
}

/// Axis-aligned latitude/longitude range approximating a circular search area.
///
/// # Examples
/// ```
/// use scoop_core::{CoordinateBoundingBox, GeoPoint};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let seoul = GeoPoint::new(37.5665, 126.9780)?;
/// let bbox = CoordinateBoundingBox::around(seoul, 1.0)?;
/// assert!(bbox.south_west().latitude < bbox.north_east().latitude);
/// assert!(bbox.contains(&seoul));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateBoundingBox {
    south_west: GeoPoint,
    north_east: GeoPoint,
}

impl CoordinateBoundingBox {
    /// Build the box covering `radius_km` around `center`.
    pub fn around(center: GeoPoint, radius_km: f64) -> Result<Self, BoundingBoxError> {
        if !radius_km.is_finite() {
            return Err(BoundingBoxError::NonFiniteRadius);
        }
        if radius_km <= 0.0 {
            return Err(BoundingBoxError::NonPositiveRadius(radius_km));
        }
        if center.latitude.abs() > MAX_CENTER_LATITUDE {
            return Err(BoundingBoxError::LatitudeOutOfRange {
                latitude: center.latitude,
                max: MAX_CENTER_LATITUDE,
            });
        }

        let lat_offset = radius_km / KM_PER_DEGREE_LATITUDE;
        let lon_offset = radius_km
            / (KM_PER_DEGREE_LONGITUDE_AT_EQUATOR * center.latitude.to_radians().cos());

        let south = center.latitude - lat_offset;
        let north = center.latitude + lat_offset;
        if south < -MAX_LATITUDE || north > MAX_LATITUDE {
            return Err(BoundingBoxError::RadiusTooLarge {
                radius_km,
                latitude: center.latitude,
            });
        }
        let west = (center.longitude - lon_offset).max(-MAX_LONGITUDE);
        let east = (center.longitude + lon_offset).min(MAX_LONGITUDE);

        Ok(Self {
            south_west: GeoPoint::new(south, west)?,
            north_east: GeoPoint::new(north, east)?,
        })
    }

    /// South-west (minimum) corner.
    #[must_use]
    pub const fn south_west(&self) -> GeoPoint {
        self.south_west
    }

    /// North-east (maximum) corner.
    #[must_use]
    pub const fn north_east(&self) -> GeoPoint {
        self.north_east
    }

    /// The box as a `geo` rectangle with `x = longitude`, `y = latitude`.
    #[must_use]
    pub fn as_rect(&self) -> Rect<f64> {
        Rect::new(Coord::from(self.south_west), Coord::from(self.north_east))
    }

    /// Whether `point` lies strictly inside the box.
    ///
    /// Points on an edge are excluded, matching the strict greater-than and
    /// less-than range filters the document store applies.
    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.as_rect().contains(&Coord::from(*point))
    }
}
