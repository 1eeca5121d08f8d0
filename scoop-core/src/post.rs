//! Reviews ("posts") and the composite key that identifies them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GeoPoint;
use crate::store::DocumentPath;

/// Sub-collection holding one review per author beneath each store document.
pub const USER_REVIEWS_COLLECTION: &str = "UserReviews";

/// Business categories a review can be filed under.
///
/// Each category names a top-level collection in the document store.
///
/// # Examples
/// ```
/// use scoop_core::PostCategory;
///
/// assert_eq!(PostCategory::Cafe.as_str(), "cafe");
/// assert_eq!("hospital".parse::<PostCategory>(), Ok(PostCategory::Hospital));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    /// Restaurants and other dining.
    Restaurant,
    /// Cafes and dessert shops.
    Cafe,
    /// Hair, nail and beauty salons.
    Beauty,
    /// Hobby studios and leisure venues.
    Hobby,
    /// Academies and tutoring.
    Education,
    /// Clinics and hospitals.
    Hospital,
}

impl PostCategory {
    /// Every category, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Restaurant,
        Self::Cafe,
        Self::Beauty,
        Self::Hobby,
        Self::Education,
        Self::Hospital,
    ];

    /// Return the collection name for the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::Beauty => "beauty",
            Self::Hobby => "hobby",
            Self::Education => "education",
            Self::Hospital => "hospital",
        }
    }
}

impl fmt::Display for PostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown post category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for PostCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// A user-authored review of a store.
///
/// # Examples
/// ```
/// use scoop_core::{GeoPoint, Post, PostCategory};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let post = Post {
///     author_uid: "user-1".into(),
///     store_name: "Blue Bottle".into(),
///     category: PostCategory::Cafe,
///     address: "Seoul, Jongno-gu".into(),
///     location: GeoPoint::new(37.57, 126.98)?,
///     post_image: None,
///     content: "Great pour-over".into(),
/// };
/// assert_eq!(
///     post.key()?.document_path().to_string(),
///     "cafe/Blue Bottle/UserReviews/user-1"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Identifier of the reviewing account.
    pub author_uid: String,
    /// Name of the reviewed store.
    pub store_name: String,
    /// Business category of the store.
    pub category: PostCategory,
    /// Road address of the store.
    pub address: String,
    /// Position of the store.
    pub location: GeoPoint,
    /// Retrieval URL of the uploaded photo, if any.
    #[serde(default)]
    pub post_image: Option<String>,
    /// Review text.
    pub content: String,
}

impl Post {
    /// Return the composite key filed under the post's own category.
    pub fn key(&self) -> Result<PostKey, PostKeyError> {
        self.key_in(self.category)
    }

    /// Return the composite key filed under `category`.
    pub fn key_in(&self, category: PostCategory) -> Result<PostKey, PostKeyError> {
        PostKey::new(category, &self.store_name, &self.author_uid)
    }
}

/// Composite key identifying one review: category, store and author.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostKey {
    category: PostCategory,
    store_name: String,
    author_uid: String,
}

/// Errors returned by [`PostKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostKeyError {
    /// A key component was empty or whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the empty component.
        field: &'static str,
    },
    /// A key component contained the path separator.
    #[error("{field} must not contain '/': {value:?}")]
    Separator {
        /// Name of the offending component.
        field: &'static str,
        /// Rejected value.
        value: String,
    },
}

impl PostKey {
    /// Validates and constructs a [`PostKey`].
    pub fn new(
        category: PostCategory,
        store_name: &str,
        author_uid: &str,
    ) -> Result<Self, PostKeyError> {
        Ok(Self {
            category,
            store_name: validate_segment("store name", store_name)?,
            author_uid: validate_segment("author uid", author_uid)?,
        })
    }

    /// Category collection of the key.
    #[must_use]
    pub const fn category(&self) -> PostCategory {
        self.category
    }

    /// Store document name of the key.
    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Author document name of the key.
    #[must_use]
    pub fn author_uid(&self) -> &str {
        &self.author_uid
    }

    /// Path `<category>/<store>/UserReviews/<author>`.
    #[must_use]
    pub fn document_path(&self) -> DocumentPath {
        DocumentPath::from_segments([
            self.category.as_str(),
            self.store_name.as_str(),
            USER_REVIEWS_COLLECTION,
            self.author_uid.as_str(),
        ])
    }
}

fn validate_segment(field: &'static str, value: &str) -> Result<String, PostKeyError> {
    if value.trim().is_empty() {
        return Err(PostKeyError::Empty { field });
    }
    if value.contains('/') {
        return Err(PostKeyError::Separator {
            field,
            value: value.to_owned(),
        });
    }
    Ok(value.to_owned())
}
