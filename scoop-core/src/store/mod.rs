//! Document storage port for reviews and profiles.
//!
//! The [`DocumentStore`] trait models a hierarchical JSON document database:
//! documents live at slash-separated paths that alternate collection and
//! document identifiers (`restaurant/<store>/UserReviews/<author>`), and
//! collection-group queries scan every collection sharing an identifier.
//!
//! [`MemoryDocumentStore`] is always available. The `store-sqlite` feature
//! adds [`SqliteDocumentStore`], which persists documents in a single table.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::query::CollectionGroupQuery;

mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use memory::MemoryDocumentStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Slash-separated location of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a slash-separated path, ignoring empty segments.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self::from_segments(path.split('/').filter(|segment| !segment.is_empty()))
    }

    /// Identifier of the collection directly containing the document.
    #[must_use]
    pub fn collection_id(&self) -> Option<&str> {
        let len = self.segments.len();
        if len < 2 {
            return None;
        }
        self.segments.get(len - 2).map(String::as_str)
    }

    /// Identifier of the document itself.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A stored JSON document and its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Where the document lives.
    pub path: DocumentPath,
    /// Raw document fields.
    pub data: Value,
}

/// Errors surfaced by [`DocumentStore`] implementations.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// The path does not name a document (odd segment count).
    #[error("{0} is not a document path")]
    InvalidPath(DocumentPath),
    /// The backing service rejected or failed the request.
    #[error("document store unavailable: {message}")]
    Unavailable {
        /// Description supplied by the backend.
        message: String,
    },
    /// Encoding a document body failed.
    #[error("failed to encode document {path}: {source}")]
    Encode {
        /// Target document.
        path: DocumentPath,
        /// JSON encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored document body is not valid JSON.
    #[error("failed to decode document {path}: {source}")]
    Decode {
        /// Offending document.
        path: DocumentPath,
        /// JSON decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("document store lock poisoned")]
    Poisoned,
    /// A blocking worker task failed to complete.
    #[error("document store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    /// Generic SQLite error.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Asynchronous access to a hierarchical JSON document store.
///
/// Each call resolves exactly once. Writes replace the whole document;
/// deleting a missing document succeeds.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or fully replace the document at `path`.
    async fn set_document(&self, path: &DocumentPath, data: Value)
    -> Result<(), DocumentStoreError>;

    /// Fetch the document at `path`, if present.
    async fn get_document(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Remove the document at `path`.
    async fn delete_document(&self, path: &DocumentPath) -> Result<(), DocumentStoreError>;

    /// Return every document in collections named `query.group` that
    /// satisfies all of the query's filters.
    async fn query_collection_group(
        &self,
        query: &CollectionGroupQuery,
    ) -> Result<Vec<Document>, DocumentStoreError>;
}

pub(crate) fn ensure_document_path(path: &DocumentPath) -> Result<(), DocumentStoreError> {
    let len = path.segments.len();
    if len == 0 || len % 2 != 0 {
        return Err(DocumentStoreError::InvalidPath(path.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_and_displays_paths() {
        let path = DocumentPath::parse("/cafe/Blue Bottle/UserReviews/user-1/");
        assert_eq!(path.to_string(), "cafe/Blue Bottle/UserReviews/user-1");
        assert_eq!(path.collection_id(), Some("UserReviews"));
        assert_eq!(path.document_id(), Some("user-1"));
    }

    #[rstest]
    #[case("cafe")]
    #[case("cafe/Blue Bottle/UserReviews")]
    #[case("")]
    fn rejects_collection_paths(#[case] raw: &str) {
        let path = DocumentPath::parse(raw);
        assert!(matches!(
            ensure_document_path(&path),
            Err(DocumentStoreError::InvalidPath(_))
        ));
    }

    #[rstest]
    fn accepts_document_paths() {
        assert!(ensure_document_path(&DocumentPath::parse("users/abc")).is_ok());
    }
}
