//! Adapters connecting Scoop's ports to concrete services.
//!
//! Responsibilities:
//! - Implement [`scoop_core::KeywordSearch`] over the Kakao Local API.
//! - Resolve administrative region codes over HTTP.
//! - Store review photos and cached values on the local filesystem.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `scoop-core`).
//! - Keep blocking I/O off async executors.
//!
//! Invariants:
//! - No global mutable state.
//! - Filesystem access stays inside each adapter's root directory.

pub mod blob;
pub mod cache;
pub mod geocoding;

pub use blob::FsBlobStore;
pub use cache::{CacheError, FileKeyValueCache};
