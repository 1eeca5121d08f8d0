//! Collection-group queries over review documents.
//!
//! A [`CollectionGroupQuery`] names a sub-collection identifier and a list of
//! [`FieldFilter`]s that must all hold. Filters evaluate directly against JSON
//! document bodies so every [`DocumentStore`](crate::DocumentStore) adapter
//! applies identical matching rules.

use serde_json::Value;

use crate::post::USER_REVIEWS_COLLECTION;
use crate::{CoordinateBoundingBox, GeoPoint, PostCategory};

/// Field holding the review category.
pub const CATEGORY_FIELD: &str = "category";
/// Field holding the reviewed store's name.
pub const STORE_NAME_FIELD: &str = "storeName";
/// Field holding the reviewed store's position.
pub const LOCATION_FIELD: &str = "location";

/// A single predicate over a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// The field equals `value` exactly.
    Equals {
        /// Top-level field name.
        field: String,
        /// Expected JSON value.
        value: Value,
    },
    /// The field is a geographic point strictly inside `bbox`.
    WithinBox {
        /// Top-level field name.
        field: String,
        /// Exclusive range on both axes.
        bbox: CoordinateBoundingBox,
    },
}

impl FieldFilter {
    /// Equality filter on `field`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Point-in-box filter on `field`.
    pub fn within_box(field: impl Into<String>, bbox: CoordinateBoundingBox) -> Self {
        Self::WithinBox {
            field: field.into(),
            bbox,
        }
    }

    /// Whether `document` satisfies the filter.
    ///
    /// Missing fields and fields of the wrong shape never match.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::Equals { field, value } => document.get(field) == Some(value),
            Self::WithinBox { field, bbox } => document
                .get(field)
                .and_then(point_from_value)
                .is_some_and(|point| bbox.contains(&point)),
        }
    }
}

fn point_from_value(raw: &Value) -> Option<GeoPoint> {
    let latitude = raw.get("latitude")?.as_f64()?;
    let longitude = raw.get("longitude")?.as_f64()?;
    GeoPoint::new(latitude, longitude).ok()
}

/// Query across every collection named [`CollectionGroupQuery::group`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionGroupQuery {
    /// Collection identifier to scan.
    pub group: String,
    /// Predicates combined with logical AND.
    pub filters: Vec<FieldFilter>,
}

impl CollectionGroupQuery {
    /// Reviews in `category` whose location falls inside `bbox`.
    ///
    /// # Examples
    /// ```
    /// use scoop_core::{CollectionGroupQuery, CoordinateBoundingBox, GeoPoint, PostCategory};
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let bbox = CoordinateBoundingBox::around(GeoPoint::new(37.5665, 126.978)?, 1.0)?;
    /// let query = CollectionGroupQuery::posts_around(PostCategory::Cafe, bbox);
    /// let doc = json!({
    ///     "category": "cafe",
    ///     "location": {"latitude": 37.567, "longitude": 126.979}
    /// });
    /// assert!(query.matches(&doc));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn posts_around(category: PostCategory, bbox: CoordinateBoundingBox) -> Self {
        Self {
            group: USER_REVIEWS_COLLECTION.to_owned(),
            filters: vec![
                FieldFilter::equals(CATEGORY_FIELD, category.as_str()),
                FieldFilter::within_box(LOCATION_FIELD, bbox),
            ],
        }
    }

    /// Reviews in `category` for the store named exactly `store_name`.
    #[must_use]
    pub fn posts_for_store(category: PostCategory, store_name: &str) -> Self {
        Self {
            group: USER_REVIEWS_COLLECTION.to_owned(),
            filters: vec![
                FieldFilter::equals(CATEGORY_FIELD, category.as_str()),
                FieldFilter::equals(STORE_NAME_FIELD, store_name),
            ],
        }
    }

    /// Whether `document` satisfies every filter.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }
}
