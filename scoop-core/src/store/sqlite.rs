//! SQLite-backed document store.
//!
//! Documents are kept as JSON text in a single `documents` table keyed by
//! path. The parent collection identifier is stored alongside each row so
//! collection-group queries can narrow the scan in SQL before the shared
//! [`CollectionGroupQuery`] filters run in Rust.
//!
//! A body that is not valid JSON fails a direct read with
//! [`DocumentStoreError::Decode`]; collection-group queries log and skip it.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use log::warn;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::query::CollectionGroupQuery;

use super::{Document, DocumentPath, DocumentStore, DocumentStoreError, ensure_document_path};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        path TEXT PRIMARY KEY,
        collection_group TEXT NOT NULL,
        data TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS documents_collection_group
        ON documents (collection_group);
";

/// Document store persisted in a SQLite database file.
///
/// Blocking SQLite calls run on Tokio's blocking pool so callers on an async
/// executor are never stalled by disk I/O.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    connection: Arc<Mutex<Connection>>,
    location: PathBuf,
}

impl fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDocumentStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SqliteDocumentStore {
    /// Open (or create) a store at `path`, creating the schema when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentStoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path)?;
        Self::with_connection(connection, path.to_path_buf())
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DocumentStoreError> {
        let connection = Connection::open_in_memory()?;
        Self::with_connection(connection, PathBuf::from(":memory:"))
    }

    fn with_connection(
        connection: Connection,
        location: PathBuf,
    ) -> Result<Self, DocumentStoreError> {
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            location,
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    async fn with_blocking<T, F>(&self, work: F) -> Result<T, DocumentStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DocumentStoreError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| DocumentStoreError::Poisoned)?;
            work(&guard)
        })
        .await?
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn set_document(
        &self,
        path: &DocumentPath,
        data: Value,
    ) -> Result<(), DocumentStoreError> {
        ensure_document_path(path)?;
        let key = path.to_string();
        let group = path.collection_id().unwrap_or_default().to_owned();
        let body = serde_json::to_string(&data).map_err(|source| DocumentStoreError::Encode {
            path: path.clone(),
            source,
        })?;
        self.with_blocking(move |connection| {
            connection.execute(
                "INSERT INTO documents (path, collection_group, data) VALUES (?1, ?2, ?3)
                 ON CONFLICT(path) DO UPDATE SET data = excluded.data",
                params![key, group, body],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_document(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Document>, DocumentStoreError> {
        ensure_document_path(path)?;
        let key = path.to_string();
        let raw = self
            .with_blocking(move |connection| {
                Ok(connection
                    .query_row(
                        "SELECT data FROM documents WHERE path = ?1",
                        params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?;
        raw.map(|body| {
            serde_json::from_str(&body)
                .map(|data| Document {
                    path: path.clone(),
                    data,
                })
                .map_err(|source| DocumentStoreError::Decode {
                    path: path.clone(),
                    source,
                })
        })
        .transpose()
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), DocumentStoreError> {
        ensure_document_path(path)?;
        let key = path.to_string();
        self.with_blocking(move |connection| {
            connection.execute("DELETE FROM documents WHERE path = ?1", params![key])?;
            Ok(())
        })
        .await
    }

    async fn query_collection_group(
        &self,
        query: &CollectionGroupQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let group = query.group.clone();
        let rows = self
            .with_blocking(move |connection| {
                let mut statement = connection.prepare(
                    "SELECT path, data FROM documents WHERE collection_group = ?1 ORDER BY path",
                )?;
                let mut rows = statement.query(params![group])?;
                let mut found = Vec::new();
                while let Some(row) = rows.next()? {
                    let path: String = row.get(0)?;
                    let body: String = row.get(1)?;
                    found.push((DocumentPath::parse(&path), body));
                }
                Ok(found)
            })
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(path, body)| {
                let data = parse_body(&path, &body)?;
                query.matches(&data).then_some(Document { path, data })
            })
            .collect())
    }
}

fn parse_body(path: &DocumentPath, body: &str) -> Option<Value> {
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("event=document_unreadable path={path} error={err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostCategory;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    #[fixture]
    fn temp_db() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("documents.db");
        (dir, path)
    }

    fn review_path(store: &str, author: &str) -> DocumentPath {
        DocumentPath::from_segments(["cafe", store, "UserReviews", author])
    }

    #[rstest]
    #[tokio::test]
    async fn documents_survive_reopening(#[from(temp_db)] (_dir, db_path): (TempDir, PathBuf)) {
        let path = review_path("Fritz", "a");
        {
            let store = SqliteDocumentStore::open(&db_path).expect("open store");
            store
                .set_document(&path, json!({"category": "cafe", "storeName": "Fritz"}))
                .await
                .expect("write document");
        }

        let reopened = SqliteDocumentStore::open(&db_path).expect("reopen store");
        let doc = reopened
            .get_document(&path)
            .await
            .expect("read document")
            .expect("document exists");
        assert_eq!(doc.data["storeName"], json!("Fritz"));
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_replaces_existing_document() {
        let store = SqliteDocumentStore::open_in_memory().expect("open store");
        let path = review_path("Fritz", "a");
        store
            .set_document(&path, json!({"content": "first"}))
            .await
            .expect("first write");
        store
            .set_document(&path, json!({"content": "second"}))
            .await
            .expect("second write");
        let doc = store
            .get_document(&path)
            .await
            .expect("read")
            .expect("document exists");
        assert_eq!(doc.data, json!({"content": "second"}));
    }

    #[rstest]
    #[tokio::test]
    async fn group_query_applies_filters() {
        let store = SqliteDocumentStore::open_in_memory().expect("open store");
        for (store_name, author) in [("Fritz", "a"), ("Fritz", "b"), ("Anthracite", "a")] {
            store
                .set_document(
                    &review_path(store_name, author),
                    json!({"category": "cafe", "storeName": store_name}),
                )
                .await
                .expect("write");
        }
        let query = CollectionGroupQuery::posts_for_store(PostCategory::Cafe, "Fritz");
        let found = store.query_collection_group(&query).await.expect("query");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|doc| doc.data["storeName"] == json!("Fritz")));
    }

    #[rstest]
    #[tokio::test]
    async fn unreadable_rows_are_skipped() {
        let store = SqliteDocumentStore::open_in_memory().expect("open store");
        store
            .with_blocking(|connection| {
                connection.execute(
                    "INSERT INTO documents (path, collection_group, data)
                     VALUES ('cafe/Fritz/UserReviews/a', 'UserReviews', 'not-json')",
                    [],
                )?;
                Ok(())
            })
            .await
            .expect("insert corrupt row");
        let query = CollectionGroupQuery::posts_for_store(PostCategory::Cafe, "Fritz");
        let found = store.query_collection_group(&query).await.expect("query");
        assert!(found.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn unreadable_row_fails_a_direct_read() {
        let store = SqliteDocumentStore::open_in_memory().expect("open store");
        store
            .with_blocking(|connection| {
                connection.execute(
                    "INSERT INTO documents (path, collection_group, data)
                     VALUES ('users/uid-1', 'users', '{truncated')",
                    [],
                )?;
                Ok(())
            })
            .await
            .expect("insert corrupt row");
        let path = DocumentPath::parse("users/uid-1");
        let err = store
            .get_document(&path)
            .await
            .expect_err("corrupt body is an error");
        match err {
            DocumentStoreError::Decode { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected Decode, found {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = SqliteDocumentStore::open_in_memory().expect("open store");
        let path = review_path("Fritz", "a");
        store.delete_document(&path).await.expect("delete missing");
        assert!(store.get_document(&path).await.expect("read").is_none());
    }
}
