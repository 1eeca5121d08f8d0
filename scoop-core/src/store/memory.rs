//! In-process document store used by tests and offline tooling.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::query::CollectionGroupQuery;

use super::{Document, DocumentPath, DocumentStore, DocumentStoreError, ensure_document_path};

/// `DocumentStore` keeping every document in an ordered map.
///
/// Collection-group queries perform a linear scan, so the store suits small
/// datasets only. Results are ordered by path.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<DocumentPath, Value>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `documents`.
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        Self {
            documents: Mutex::new(
                documents
                    .into_iter()
                    .map(|document| (document.path, document.data))
                    .collect(),
            ),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, DocumentStoreError> {
        Ok(self.lock()?.len())
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> Result<bool, DocumentStoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<DocumentPath, Value>>, DocumentStoreError> {
        self.documents
            .lock()
            .map_err(|_| DocumentStoreError::Poisoned)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set_document(
        &self,
        path: &DocumentPath,
        data: Value,
    ) -> Result<(), DocumentStoreError> {
        ensure_document_path(path)?;
        self.lock()?.insert(path.clone(), data);
        Ok(())
    }

    async fn get_document(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Document>, DocumentStoreError> {
        ensure_document_path(path)?;
        Ok(self.lock()?.get(path).map(|data| Document {
            path: path.clone(),
            data: data.clone(),
        }))
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), DocumentStoreError> {
        ensure_document_path(path)?;
        self.lock()?.remove(path);
        Ok(())
    }

    async fn query_collection_group(
        &self,
        query: &CollectionGroupQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let documents = self.lock()?;
        Ok(documents
            .iter()
            .filter(|(path, _)| path.collection_id() == Some(query.group.as_str()))
            .filter(|(_, data)| query.matches(data))
            .map(|(path, data)| Document {
                path: path.clone(),
                data: data.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostCategory;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn review_path(store: &str, author: &str) -> DocumentPath {
        DocumentPath::from_segments(["cafe", store, "UserReviews", author])
    }

    #[fixture]
    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::with_documents([
            Document {
                path: review_path("Blue Bottle", "a"),
                data: json!({"category": "cafe", "storeName": "Blue Bottle"}),
            },
            Document {
                path: review_path("Blue Bottle", "b"),
                data: json!({"category": "cafe", "storeName": "Blue Bottle"}),
            },
            Document {
                path: review_path("Fritz", "a"),
                data: json!({"category": "cafe", "storeName": "Fritz"}),
            },
            Document {
                path: DocumentPath::parse("users/a"),
                data: json!({"category": "cafe", "storeName": "Blue Bottle"}),
            },
        ])
    }

    #[rstest]
    #[tokio::test]
    async fn group_query_only_scans_matching_collections(store: MemoryDocumentStore) {
        let query = CollectionGroupQuery::posts_for_store(PostCategory::Cafe, "Blue Bottle");
        let found = store
            .query_collection_group(&query)
            .await
            .expect("query succeeds");
        let paths: Vec<_> = found.iter().map(|doc| doc.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "cafe/Blue Bottle/UserReviews/a",
                "cafe/Blue Bottle/UserReviews/b"
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn set_replaces_whole_document(store: MemoryDocumentStore) {
        let path = review_path("Fritz", "a");
        store
            .set_document(&path, json!({"content": "replaced"}))
            .await
            .expect("write succeeds");
        let doc = store
            .get_document(&path)
            .await
            .expect("read succeeds")
            .expect("document exists");
        assert_eq!(doc.data, json!({"content": "replaced"}));
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_missing_document_succeeds(store: MemoryDocumentStore) {
        let path = review_path("Nowhere", "z");
        store.delete_document(&path).await.expect("idempotent delete");
        assert_eq!(store.len().expect("lock"), 4);
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_collection_paths() {
        let store = MemoryDocumentStore::new();
        let err = store
            .set_document(&DocumentPath::parse("cafe"), json!({}))
            .await
            .expect_err("collection path rejected");
        assert!(matches!(err, DocumentStoreError::InvalidPath(_)));
    }
}
