//! Core domain types and data-access facades for Scoop.
//!
//! Scoop stores location-based store reviews ("posts") in a hierarchical
//! document store, keeps review photos in a blob store and looks places up
//! through a keyword-search provider. This crate defines those three ports as
//! traits together with the logic that sits on top of them:
//!
//! - [`CoordinateBoundingBox`] turns a centre and radius into a search box.
//! - [`CollectionGroupQuery`] describes the review queries the app issues.
//! - [`aggregate`] decodes query batches, reporting undecodable documents.
//! - [`PostRepository`] and [`UserInfoRepository`] compose the ports.
//! - [`LocationService`] drives the device location flow.
//!
//! Adapters for concrete services live in `scoop-data`.

mod aggregate;
mod blob;
mod bounds;
mod location;
mod point;
mod post;
mod query;
mod repository;
mod search;
pub mod store;
mod user;

#[doc(hidden)]
pub mod test_support;

pub use aggregate::{Aggregation, Skipped, aggregate};
pub use blob::{
    BlobPath, BlobStore, BlobStoreError, EncodedPhoto, ImageEncodeError, JPEG_COMPRESSION_QUALITY,
    POST_IMAGES_FOLDER, PostImage,
};
pub use bounds::{
    BoundingBoxError, CoordinateBoundingBox, KM_PER_DEGREE_LATITUDE,
    KM_PER_DEGREE_LONGITUDE_AT_EQUATOR, MAX_CENTER_LATITUDE,
};
pub use location::{
    AuthorizationStatus, CachedUserLocation, LocationError, LocationEvent, LocationProvider,
    LocationService, USER_LOCATION_CACHE_KEY,
};
pub use point::{GeoPoint, GeoPointError};
pub use post::{
    Post, PostCategory, PostKey, PostKeyError, USER_REVIEWS_COLLECTION, UnknownCategory,
};
pub use query::{
    CATEGORY_FIELD, CollectionGroupQuery, FieldFilter, LOCATION_FIELD, STORE_NAME_FIELD,
};
pub use repository::{PostRepository, PostRepositoryError};
pub use search::{
    KeywordSearch, KeywordSearchError, KeywordSearchRequest, KeywordSearchResult, Place,
    SameName, SearchMeta,
};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteDocumentStore;
pub use store::{Document, DocumentPath, DocumentStore, DocumentStoreError, MemoryDocumentStore};
pub use user::{USERS_COLLECTION, UserInfo, UserInfoError, UserInfoRepository};
