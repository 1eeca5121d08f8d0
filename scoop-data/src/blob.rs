//! Filesystem-backed blob store.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use log::debug;
use scoop_core::{BlobPath, BlobStore, BlobStoreError};
use url::Url;

/// [`BlobStore`] keeping each object as a file below a root directory.
///
/// Object names map onto relative paths, so `postImages/<id>.jpg` becomes
/// `<root>/postImages/<id>.jpg`. Retrieval URLs are `file://` URLs. File I/O
/// runs on Tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: Utf8PathBuf,
    dir: Arc<Dir>,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created, opened or
    /// resolved to an absolute path.
    pub fn open(root: impl AsRef<Utf8Path>) -> io::Result<Self> {
        let dir = scoop_fs::open_root(root.as_ref())?;
        let root = root.as_ref().canonicalize_utf8()?;
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    /// Absolute root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn blocking<T, F>(&self, path: &BlobPath, work: F) -> Result<T, BlobStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &Utf8Path) -> io::Result<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let name = Utf8PathBuf::from(path.as_str());
        let outcome = tokio::task::spawn_blocking(move || work(&dir, &name)).await?;
        outcome.map_err(|source| match source.kind() {
            io::ErrorKind::InvalidInput => BlobStoreError::InvalidPath(path.clone()),
            _ => BlobStoreError::Io {
                path: path.clone(),
                source,
            },
        })
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<(), BlobStoreError> {
        let size = bytes.len();
        self.blocking(path, move |dir, name| scoop_fs::write_file(dir, name, &bytes))
            .await?;
        debug!("event=blob_stored path={path} bytes={size}");
        Ok(())
    }

    async fn download_url(&self, path: &BlobPath) -> Result<Url, BlobStoreError> {
        let exists = self
            .blocking(path, |dir, name| scoop_fs::file_is_file(dir, name))
            .await?;
        if !exists {
            return Err(BlobStoreError::NotFound(path.clone()));
        }
        let absolute = self.root.join(path.as_str());
        Url::from_file_path(absolute.as_std_path()).map_err(|()| BlobStoreError::Unavailable {
            message: format!("cannot express {absolute} as a file URL"),
        })
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), BlobStoreError> {
        let removed = self
            .blocking(path, |dir, name| scoop_fs::remove_if_exists(dir, name))
            .await?;
        debug!("event=blob_deleted path={path} existed={removed}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn store() -> (TempDir, FsBlobStore) {
        let temp = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().join("blobs")).expect("utf-8 path");
        let store = FsBlobStore::open(&root).expect("open store");
        (temp, store)
    }

    #[rstest]
    #[tokio::test]
    async fn stored_objects_resolve_to_file_urls(
        #[from(store)] (_temp, store): (TempDir, FsBlobStore),
    ) {
        let path = BlobPath::post_image();
        store.put(&path, vec![0xFF, 0xD8]).await.expect("put");
        let url = store.download_url(&path).await.expect("url");
        assert_eq!(url.scheme(), "file");
        let on_disk = url.to_file_path().expect("file path");
        assert_eq!(std::fs::read(on_disk).expect("read back"), vec![0xFF, 0xD8]);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_objects_have_no_url(#[from(store)] (_temp, store): (TempDir, FsBlobStore)) {
        let err = store
            .download_url(&BlobPath::new("postImages/none.jpg"))
            .await
            .expect_err("missing object");
        assert!(matches!(err, BlobStoreError::NotFound(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_is_idempotent(#[from(store)] (_temp, store): (TempDir, FsBlobStore)) {
        let path = BlobPath::post_image();
        store.put(&path, vec![1]).await.expect("put");
        store.delete(&path).await.expect("first delete");
        store.delete(&path).await.expect("second delete");
        assert!(matches!(
            store.download_url(&path).await,
            Err(BlobStoreError::NotFound(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn escaping_names_are_rejected(#[from(store)] (_temp, store): (TempDir, FsBlobStore)) {
        let err = store
            .put(&BlobPath::new("../outside.jpg"), vec![1])
            .await
            .expect_err("escape rejected");
        assert!(matches!(err, BlobStoreError::InvalidPath(_)));
    }
}
