//! Facade crate for Scoop, a location-based store review backend.
//!
//! This crate re-exports the core domain types and repositories, and exposes
//! the HTTP and filesystem adapters behind the `adapters` feature.

#![forbid(unsafe_code)]

pub use scoop_core::{
    Aggregation, BlobPath, BlobStore, BlobStoreError, CachedUserLocation, CollectionGroupQuery,
    CoordinateBoundingBox, DocumentPath, DocumentStore, DocumentStoreError, EncodedPhoto, GeoPoint,
    KeywordSearch, KeywordSearchError, KeywordSearchRequest, KeywordSearchResult, LocationService,
    MemoryDocumentStore, Place, Post, PostCategory, PostImage, PostKey, PostRepository,
    PostRepositoryError, UserInfo, UserInfoRepository,
};

#[cfg(feature = "store-sqlite")]
pub use scoop_core::SqliteDocumentStore;

#[cfg(feature = "adapters")]
pub use scoop_data::geocoding::{KakaoKeywordSearch, RegionCodeClient};
#[cfg(feature = "adapters")]
pub use scoop_data::{FileKeyValueCache, FsBlobStore};
