//! Review persistence facade.
//!
//! [`PostRepository`] composes the document store, blob store and keyword
//! search ports into the operations the application performs on reviews.
//! Every operation resolves exactly once; none retries.

use log::{debug, info, warn};
use thiserror::Error;

use crate::GeoPoint;
use crate::aggregate::{Aggregation, aggregate};
use crate::blob::{
    BlobPath, BlobStore, BlobStoreError, ImageEncodeError, JPEG_COMPRESSION_QUALITY, PostImage,
};
use crate::bounds::{BoundingBoxError, CoordinateBoundingBox};
use crate::post::{Post, PostCategory, PostKey, PostKeyError};
use crate::query::CollectionGroupQuery;
use crate::search::{KeywordSearch, KeywordSearchError, KeywordSearchRequest, KeywordSearchResult};
use crate::store::{DocumentPath, DocumentStore, DocumentStoreError};

/// Errors returned by [`PostRepository`] operations.
#[derive(Debug, Error)]
pub enum PostRepositoryError {
    /// The post's store name or author cannot form a document key.
    #[error("invalid post key: {0}")]
    InvalidKey(#[from] PostKeyError),
    /// The photo could not be encoded for upload.
    #[error("failed to encode post image: {0}")]
    ImageEncoding(#[from] ImageEncodeError),
    /// Uploading the photo failed.
    #[error("failed to upload post image {path}: {source}")]
    Upload {
        /// Target object.
        path: BlobPath,
        /// Blob store failure.
        #[source]
        source: BlobStoreError,
    },
    /// The uploaded photo's retrieval URL could not be resolved.
    #[error("failed to resolve download URL for {path}: {source}")]
    DownloadUrl {
        /// Uploaded object.
        path: BlobPath,
        /// Blob store failure.
        #[source]
        source: BlobStoreError,
    },
    /// The post could not be serialised.
    #[error("failed to encode post: {0}")]
    Encode(#[from] serde_json::Error),
    /// Writing the post document failed.
    #[error("failed to write post {path}: {source}")]
    Write {
        /// Target document.
        path: DocumentPath,
        /// Document store failure.
        #[source]
        source: DocumentStoreError,
    },
    /// Deleting the post document failed.
    #[error("failed to delete post {path}: {source}")]
    Delete {
        /// Target document.
        path: DocumentPath,
        /// Document store failure.
        #[source]
        source: DocumentStoreError,
    },
    /// A collection-group query failed.
    #[error("post query failed: {0}")]
    Query(#[source] DocumentStoreError),
    /// The search area could not be built.
    #[error("invalid search area: {0}")]
    InvalidArea(#[from] BoundingBoxError),
    /// The keyword search provider failed.
    #[error(transparent)]
    Search(#[from] KeywordSearchError),
}

/// Facade over the document, blob and keyword-search ports.
///
/// # Examples
/// ```
/// use scoop_core::test_support::{MemoryBlobStore, StubKeywordSearch, sample_jpeg, sample_post};
/// use scoop_core::{GeoPoint, MemoryDocumentStore, PostCategory, PostRepository};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = PostRepository::new(
///     MemoryDocumentStore::new(),
///     MemoryBlobStore::new(),
///     StubKeywordSearch::default(),
/// );
/// let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5404, 126.9497);
/// repository.add_post(&post, &sample_jpeg()).await?;
///
/// let centre = GeoPoint::new(37.5404, 126.9497)?;
/// let found = repository
///     .fetch_posts_around_coordinate(PostCategory::Cafe, centre, 1.0)
///     .await?;
/// assert_eq!(found.posts.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PostRepository<D, B, S> {
    documents: D,
    blobs: B,
    search: S,
}

impl<D, B, S> PostRepository<D, B, S>
where
    D: DocumentStore,
    B: BlobStore,
    S: KeywordSearch,
{
    /// Compose a repository from its ports.
    pub const fn new(documents: D, blobs: B, search: S) -> Self {
        Self {
            documents,
            blobs,
            search,
        }
    }

    /// Borrow the document store.
    pub const fn documents(&self) -> &D {
        &self.documents
    }

    /// Borrow the blob store.
    pub const fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Borrow the keyword search provider.
    pub const fn search(&self) -> &S {
        &self.search
    }

    /// Upload `image`, then store `post` with the photo's URL attached.
    ///
    /// The post is filed under its own category. When the final write fails
    /// the uploaded photo is removed again; a failed removal is logged and
    /// the write error is still returned. Returns the post as stored.
    pub async fn add_post<I>(&self, post: &Post, image: &I) -> Result<Post, PostRepositoryError>
    where
        I: PostImage + ?Sized,
    {
        let key = post.key()?;
        let bytes = image.encode_jpeg(JPEG_COMPRESSION_QUALITY)?;
        let blob = BlobPath::post_image();

        self.blobs
            .put(&blob, bytes)
            .await
            .map_err(|source| PostRepositoryError::Upload {
                path: blob.clone(),
                source,
            })?;
        let url = match self.blobs.download_url(&blob).await {
            Ok(url) => url,
            Err(source) => {
                self.discard_blob(&blob).await;
                return Err(PostRepositoryError::DownloadUrl { path: blob, source });
            }
        };

        let mut stored = post.clone();
        stored.post_image = Some(url.to_string());
        if let Err(err) = self.write(&key, &stored).await {
            self.discard_blob(&blob).await;
            return Err(err);
        }
        info!(
            "event=post_added path={} image={blob}",
            key.document_path()
        );
        Ok(stored)
    }

    /// Replace the stored post at its key under `category`.
    ///
    /// No concurrency check is made; the last writer wins.
    pub async fn update_post(
        &self,
        post: &Post,
        category: PostCategory,
    ) -> Result<(), PostRepositoryError> {
        let key = post.key_in(category)?;
        self.write(&key, post).await?;
        info!("event=post_updated path={}", key.document_path());
        Ok(())
    }

    /// Remove the post at its key under `category`.
    ///
    /// Deleting a post that does not exist succeeds.
    pub async fn delete_post(
        &self,
        post: &Post,
        category: PostCategory,
    ) -> Result<(), PostRepositoryError> {
        self.delete_post_at(&post.key_in(category)?).await
    }

    /// Remove the post stored under `key`, whether or not it still decodes.
    ///
    /// Deleting a post that does not exist succeeds.
    pub async fn delete_post_at(&self, key: &PostKey) -> Result<(), PostRepositoryError> {
        let path = key.document_path();
        self.documents
            .delete_document(&path)
            .await
            .map_err(|source| PostRepositoryError::Delete {
                path: path.clone(),
                source,
            })?;
        info!("event=post_deleted path={path}");
        Ok(())
    }

    /// Reviews in `category` within roughly `radius_km` of `center`.
    ///
    /// Documents that fail to decode are reported in
    /// [`Aggregation::skipped`] rather than failing the call.
    pub async fn fetch_posts_around_coordinate(
        &self,
        category: PostCategory,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Aggregation, PostRepositoryError> {
        let bbox = CoordinateBoundingBox::around(center, radius_km)?;
        debug!(
            "event=posts_around category={category} radius_km={radius_km} sw={:?} ne={:?}",
            bbox.south_west(),
            bbox.north_east()
        );
        self.run(&CollectionGroupQuery::posts_around(category, bbox))
            .await
    }

    /// Reviews in `category` for the store named exactly `store_name`.
    pub async fn fetch_posts_store(
        &self,
        store_name: &str,
        category: PostCategory,
    ) -> Result<Aggregation, PostRepositoryError> {
        debug!("event=posts_for_store category={category} store={store_name}");
        self.run(&CollectionGroupQuery::posts_for_store(category, store_name))
            .await
    }

    /// Forward a keyword search to the provider unchanged.
    pub async fn search_location(
        &self,
        query: &str,
        longitude: &str,
        latitude: &str,
        radius: u32,
    ) -> Result<KeywordSearchResult, PostRepositoryError> {
        let request = KeywordSearchRequest {
            query: query.to_owned(),
            longitude: longitude.to_owned(),
            latitude: latitude.to_owned(),
            radius,
        };
        Ok(self.search.search(&request).await?)
    }

    async fn write(&self, key: &PostKey, post: &Post) -> Result<(), PostRepositoryError> {
        let path = key.document_path();
        let data = serde_json::to_value(post)?;
        self.documents
            .set_document(&path, data)
            .await
            .map_err(|source| PostRepositoryError::Write { path, source })
    }

    async fn run(&self, query: &CollectionGroupQuery) -> Result<Aggregation, PostRepositoryError> {
        let documents = self
            .documents
            .query_collection_group(query)
            .await
            .map_err(PostRepositoryError::Query)?;
        let result = aggregate(documents);
        debug!(
            "event=posts_fetched count={} skipped={}",
            result.posts.len(),
            result.skipped_count()
        );
        Ok(result)
    }

    async fn discard_blob(&self, blob: &BlobPath) {
        if let Err(err) = self.blobs.delete(blob).await {
            warn!("event=image_cleanup_failed path={blob} error={err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FlakyDocumentStore, MemoryBlobStore, StubKeywordSearch, sample_jpeg, sample_post,
    };
    use crate::{EncodedPhoto, MemoryDocumentStore};
    use rstest::{fixture, rstest};

    type TestRepository = PostRepository<FlakyDocumentStore, MemoryBlobStore, StubKeywordSearch>;

    #[fixture]
    fn repository() -> TestRepository {
        PostRepository::new(
            FlakyDocumentStore::default(),
            MemoryBlobStore::new(),
            StubKeywordSearch::default(),
        )
    }

    fn seoul() -> GeoPoint {
        GeoPoint::new(37.5665, 126.9780).expect("valid point")
    }

    #[rstest]
    #[tokio::test]
    async fn add_post_attaches_uploaded_image_url(repository: TestRepository) {
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5665, 126.978);
        let stored = repository
            .add_post(&post, &sample_jpeg())
            .await
            .expect("add succeeds");

        let url = stored.post_image.as_deref().expect("image url set");
        assert!(url.starts_with("memory://blobs/postImages/"));
        assert!(url.ends_with(".jpg"));
        assert_eq!(repository.blobs().object_count(), 1);

        let found = repository
            .fetch_posts_store("Fritz", PostCategory::Cafe)
            .await
            .expect("query succeeds");
        assert_eq!(found.posts, vec![stored]);
    }

    #[rstest]
    #[tokio::test]
    async fn add_post_rejects_undecodable_photo_before_upload(repository: TestRepository) {
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5, 127.0);
        let err = repository
            .add_post(&post, &EncodedPhoto::new(b"GIF89a".to_vec()))
            .await
            .expect_err("encoding fails");
        assert!(matches!(err, PostRepositoryError::ImageEncoding(_)));
        assert_eq!(repository.blobs().object_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn add_post_reports_upload_failure() {
        let repository = PostRepository::new(
            MemoryDocumentStore::new(),
            MemoryBlobStore::new().failing_uploads(),
            StubKeywordSearch::default(),
        );
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5, 127.0);
        let err = repository
            .add_post(&post, &sample_jpeg())
            .await
            .expect_err("upload fails");
        assert!(matches!(err, PostRepositoryError::Upload { .. }));
        assert!(repository.documents().is_empty().expect("lock"));
    }

    #[rstest]
    #[tokio::test]
    async fn add_post_reports_url_failure_and_discards_upload() {
        let repository = PostRepository::new(
            MemoryDocumentStore::new(),
            MemoryBlobStore::new().failing_urls(),
            StubKeywordSearch::default(),
        );
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5, 127.0);
        let err = repository
            .add_post(&post, &sample_jpeg())
            .await
            .expect_err("url lookup fails");
        assert!(matches!(err, PostRepositoryError::DownloadUrl { .. }));
        assert_eq!(repository.blobs().object_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_write_removes_uploaded_image(repository: TestRepository) {
        repository.documents().set_fail_writes(true);
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5, 127.0);
        let err = repository
            .add_post(&post, &sample_jpeg())
            .await
            .expect_err("write fails");
        assert!(matches!(err, PostRepositoryError::Write { .. }));
        assert_eq!(repository.blobs().object_count(), 0);
        assert_eq!(repository.blobs().deleted().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_cleanup_still_returns_write_error() {
        let repository = PostRepository::new(
            FlakyDocumentStore::default(),
            MemoryBlobStore::new().failing_deletes(),
            StubKeywordSearch::default(),
        );
        repository.documents().set_fail_writes(true);
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5, 127.0);
        let err = repository
            .add_post(&post, &sample_jpeg())
            .await
            .expect_err("write fails");
        assert!(matches!(err, PostRepositoryError::Write { .. }));
        assert_eq!(repository.blobs().object_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn update_post_files_under_the_given_category(repository: TestRepository) {
        let mut post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5665, 126.978);
        repository
            .update_post(&post, PostCategory::Cafe)
            .await
            .expect("first write");
        post.content = "Changed my mind.".to_owned();
        repository
            .update_post(&post, PostCategory::Cafe)
            .await
            .expect("overwrite");

        let found = repository
            .fetch_posts_store("Fritz", PostCategory::Cafe)
            .await
            .expect("query succeeds");
        assert_eq!(found.posts, vec![post]);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_post_is_idempotent(repository: TestRepository) {
        let post = sample_post("user-1", "Fritz", PostCategory::Cafe, 37.5665, 126.978);
        repository
            .update_post(&post, PostCategory::Cafe)
            .await
            .expect("write");
        for _ in 0..2 {
            repository
                .delete_post(&post, PostCategory::Cafe)
                .await
                .expect("delete succeeds");
        }
        let found = repository
            .fetch_posts_around_coordinate(PostCategory::Cafe, seoul(), 1.0)
            .await
            .expect("query succeeds");
        assert!(found.posts.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn delete_post_at_removes_undecodable_documents(repository: TestRepository) {
        let key = PostKey::new(PostCategory::Cafe, "Fritz", "user-1").expect("valid key");
        let path = key.document_path();
        repository
            .documents()
            .set_document(&path, serde_json::json!({"location": "not a point"}))
            .await
            .expect("write");
        repository
            .delete_post_at(&key)
            .await
            .expect("delete succeeds");
        let remaining = repository
            .documents()
            .get_document(&path)
            .await
            .expect("read succeeds");
        assert_eq!(remaining, None);
    }

    #[rstest]
    #[tokio::test]
    async fn fetch_around_filters_by_category_and_distance(repository: TestRepository) {
        let near = sample_post("a", "Fritz", PostCategory::Cafe, 37.567, 126.979);
        let far = sample_post("b", "Anthracite", PostCategory::Cafe, 37.7, 126.979);
        let other = sample_post(
            "c",
            "Gwanghwamun Gukbap",
            PostCategory::Restaurant,
            37.567,
            126.979,
        );
        for post in [&near, &far, &other] {
            repository
                .update_post(post, post.category)
                .await
                .expect("write");
        }

        let found = repository
            .fetch_posts_around_coordinate(PostCategory::Cafe, seoul(), 1.0)
            .await
            .expect("query succeeds");
        assert_eq!(found.posts, vec![near]);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-3.0)]
    #[tokio::test]
    async fn fetch_around_rejects_invalid_radius(
        repository: TestRepository,
        #[case] radius: f64,
    ) {
        let err = repository
            .fetch_posts_around_coordinate(PostCategory::Cafe, seoul(), radius)
            .await
            .expect_err("invalid radius");
        assert!(matches!(err, PostRepositoryError::InvalidArea(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn query_failures_surface(repository: TestRepository) {
        repository.documents().set_fail_queries(true);
        let err = repository
            .fetch_posts_store("Fritz", PostCategory::Cafe)
            .await
            .expect_err("query fails");
        assert!(matches!(err, PostRepositoryError::Query(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn search_location_forwards_parameters(repository: TestRepository) {
        repository
            .search_location("커피", "126.978", "37.5665", 500)
            .await
            .expect("search succeeds");
        let requests = repository.search().requests();
        assert_eq!(
            requests,
            vec![KeywordSearchRequest {
                query: "커피".to_owned(),
                longitude: "126.978".to_owned(),
                latitude: "37.5665".to_owned(),
                radius: 500,
            }]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn search_errors_pass_through() {
        let repository = PostRepository::new(
            MemoryDocumentStore::new(),
            MemoryBlobStore::new(),
            StubKeywordSearch::with_error(KeywordSearchError::Network {
                url: "http://localhost".to_owned(),
                message: "connection refused".to_owned(),
            }),
        );
        let err = repository
            .search_location("커피", "126.978", "37.5665", 500)
            .await
            .expect_err("search fails");
        assert!(matches!(
            err,
            PostRepositoryError::Search(KeywordSearchError::Network { .. })
        ));
    }
}
