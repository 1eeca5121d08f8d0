//! Property-based tests for bounding box construction.
//!
//! Every accepted centre and radius must yield a box whose corners are valid
//! coordinates with the south-west corner strictly below and left of the
//! north-east corner. Radii that cannot fit are rejected, never wrapped.

use proptest::prelude::*;
use scoop_core::{BoundingBoxError, CoordinateBoundingBox, GeoPoint, KM_PER_DEGREE_LATITUDE};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Property: accepted boxes have ordered, valid corners.
    #[test]
    fn accepted_boxes_have_valid_ordered_corners(
        latitude in -85.0_f64..85.0,
        longitude in -180.0_f64..=180.0,
        radius_km in 0.001_f64..2_000.0,
    ) {
        let center = GeoPoint::new(latitude, longitude).expect("strategy yields valid centres");
        match CoordinateBoundingBox::around(center, radius_km) {
            Ok(bbox) => {
                let sw = bbox.south_west();
                let ne = bbox.north_east();
                prop_assert!(GeoPoint::new(sw.latitude, sw.longitude).is_ok(), "{sw:?}");
                prop_assert!(GeoPoint::new(ne.latitude, ne.longitude).is_ok(), "{ne:?}");
                prop_assert!(sw.latitude < ne.latitude, "{bbox:?}");
                prop_assert!(sw.longitude < ne.longitude, "{bbox:?}");
                prop_assert!(sw.latitude < latitude && latitude < ne.latitude);
            }
            Err(err) => {
                prop_assert!(
                    matches!(err, BoundingBoxError::RadiusTooLarge { .. }),
                    "unexpected error {err:?}"
                );
                let lat_offset = radius_km / KM_PER_DEGREE_LATITUDE;
                prop_assert!(latitude.abs() + lat_offset > 90.0);
            }
        }
    }

    /// Property: radii that stay clear of the poles are always accepted.
    #[test]
    fn radii_clear_of_the_poles_are_accepted(
        latitude in -60.0_f64..60.0,
        longitude in -180.0_f64..=180.0,
        radius_km in 0.001_f64..3_000.0,
    ) {
        let center = GeoPoint::new(latitude, longitude).expect("strategy yields valid centres");
        prop_assert!(CoordinateBoundingBox::around(center, radius_km).is_ok());
    }
}
