//! Deterministic test doubles for the storage, search and location ports.
//!
//! These helpers let unit and behaviour tests drive
//! [`PostRepository`](crate::PostRepository) and
//! [`LocationService`](crate::LocationService) without a hosted database,
//! a network or a GPS receiver. Each double can be told to fail so error
//! paths are reachable.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use url::Url;

use crate::{
    AuthorizationStatus, BlobPath, BlobStore, BlobStoreError, CollectionGroupQuery, Document,
    DocumentPath, DocumentStore, DocumentStoreError, EncodedPhoto, GeoPoint, KeywordSearch,
    KeywordSearchError, KeywordSearchRequest, KeywordSearchResult, LocationProvider,
    MemoryDocumentStore, Post, PostCategory,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a post with fixed address and content.
///
/// # Panics
///
/// Panics when the coordinate is invalid.
#[must_use]
pub fn sample_post(
    author_uid: &str,
    store_name: &str,
    category: PostCategory,
    latitude: f64,
    longitude: f64,
) -> Post {
    let location = GeoPoint::new(latitude, longitude).expect("valid sample coordinate");
    Post {
        author_uid: author_uid.to_owned(),
        store_name: store_name.to_owned(),
        category,
        address: "서울 종로구 세종대로 110".to_owned(),
        location,
        post_image: None,
        content: "Worth the queue.".to_owned(),
    }
}

/// Width and height of the generated sample photo.
pub const SAMPLE_IMAGE_SIZE: (u32, u32) = (48, 32);

fn sample_image() -> RgbImage {
    let (width, height) = SAMPLE_IMAGE_SIZE;
    RgbImage::from_fn(width, height, |x, y| {
        let noise = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503);
        Rgb([
            (noise % 251) as u8,
            ((x * 5).wrapping_add(noise) % 241) as u8,
            ((y * 7).wrapping_add(noise >> 8) % 239) as u8,
        ])
    })
}

fn encode_sample(format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    sample_image()
        .write_to(&mut bytes, format)
        .expect("in-memory sample encodes");
    bytes.into_inner()
}

/// A small, detailed PNG image.
///
/// # Panics
///
/// Panics if the in-memory PNG encoder fails.
#[must_use]
pub fn sample_png_bytes() -> Vec<u8> {
    encode_sample(ImageFormat::Png)
}

/// The sample image as JPEG bytes, as a camera would produce them.
///
/// # Panics
///
/// Panics if the in-memory JPEG encoder fails.
#[must_use]
pub fn sample_jpeg_bytes() -> Vec<u8> {
    encode_sample(ImageFormat::Jpeg)
}

/// The sample JPEG wrapped for [`PostRepository::add_post`](crate::PostRepository::add_post).
#[must_use]
pub fn sample_jpeg() -> EncodedPhoto {
    EncodedPhoto::new(sample_jpeg_bytes())
}

/// In-memory [`BlobStore`] with switchable failures.
///
/// Retrieval URLs use the `memory://blobs/` scheme.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<BlobPath, Vec<u8>>>,
    deleted: Mutex<Vec<BlobPath>>,
    fail_put: AtomicBool,
    fail_url: AtomicBool,
    fail_delete: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty store that never fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload fail.
    #[must_use]
    pub fn failing_uploads(self) -> Self {
        self.fail_put.store(true, Ordering::SeqCst);
        self
    }

    /// Make every URL lookup fail.
    #[must_use]
    pub fn failing_urls(self) -> Self {
        self.fail_url.store(true, Ordering::SeqCst);
        self
    }

    /// Make every delete fail.
    #[must_use]
    pub fn failing_deletes(self) -> Self {
        self.fail_delete.store(true, Ordering::SeqCst);
        self
    }

    /// Whether an object is stored under `path`.
    #[must_use]
    pub fn contains(&self, path: &BlobPath) -> bool {
        lock(&self.objects).contains_key(path)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Paths passed to [`BlobStore::delete`], in call order.
    #[must_use]
    pub fn deleted(&self) -> Vec<BlobPath> {
        lock(&self.deleted).clone()
    }

    fn unavailable(operation: &str) -> BlobStoreError {
        BlobStoreError::Unavailable {
            message: format!("injected {operation} failure"),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<(), BlobStoreError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Self::unavailable("upload"));
        }
        lock(&self.objects).insert(path.clone(), bytes);
        Ok(())
    }

    async fn download_url(&self, path: &BlobPath) -> Result<Url, BlobStoreError> {
        if self.fail_url.load(Ordering::SeqCst) {
            return Err(Self::unavailable("URL lookup"));
        }
        if !self.contains(path) {
            return Err(BlobStoreError::NotFound(path.clone()));
        }
        Url::parse(&format!("memory://blobs/{path}")).map_err(|err| BlobStoreError::Unavailable {
            message: err.to_string(),
        })
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), BlobStoreError> {
        lock(&self.deleted).push(path.clone());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unavailable("delete"));
        }
        lock(&self.objects).remove(path);
        Ok(())
    }
}

/// [`MemoryDocumentStore`] wrapper that can refuse writes or queries.
#[derive(Debug, Default)]
pub struct FlakyDocumentStore {
    inner: MemoryDocumentStore,
    fail_writes: AtomicBool,
    fail_queries: AtomicBool,
}

impl FlakyDocumentStore {
    /// Wrap an existing store; no failures are injected initially.
    #[must_use]
    pub fn new(inner: MemoryDocumentStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Toggle write and delete failures.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Toggle query failures.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Borrow the wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), DocumentStoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Unavailable {
                message: format!("injected {operation} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyDocumentStore {
    async fn set_document(
        &self,
        path: &DocumentPath,
        data: Value,
    ) -> Result<(), DocumentStoreError> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.set_document(path, data).await
    }

    async fn get_document(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Document>, DocumentStoreError> {
        Self::check(&self.fail_queries, "read")?;
        self.inner.get_document(path).await
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), DocumentStoreError> {
        Self::check(&self.fail_writes, "delete")?;
        self.inner.delete_document(path).await
    }

    async fn query_collection_group(
        &self,
        query: &CollectionGroupQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        Self::check(&self.fail_queries, "query")?;
        self.inner.query_collection_group(query).await
    }
}

/// [`KeywordSearch`] returning a canned response and recording requests.
#[derive(Debug)]
pub struct StubKeywordSearch {
    response: Result<KeywordSearchResult, KeywordSearchError>,
    requests: Mutex<Vec<KeywordSearchRequest>>,
}

impl Default for StubKeywordSearch {
    fn default() -> Self {
        Self::with_result(KeywordSearchResult::default())
    }
}

impl StubKeywordSearch {
    /// Respond to every search with `result`.
    #[must_use]
    pub fn with_result(result: KeywordSearchResult) -> Self {
        Self {
            response: Ok(result),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every search with `error`.
    #[must_use]
    pub fn with_error(error: KeywordSearchError) -> Self {
        Self {
            response: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<KeywordSearchRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl KeywordSearch for StubKeywordSearch {
    async fn search(
        &self,
        request: &KeywordSearchRequest,
    ) -> Result<KeywordSearchResult, KeywordSearchError> {
        lock(&self.requests).push(request.clone());
        self.response.clone()
    }
}

/// A call made by [`LocationService`](crate::LocationService) into its
/// provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCall {
    /// [`LocationProvider::request_authorization`].
    RequestAuthorization,
    /// [`LocationProvider::start_updating`].
    StartUpdating,
    /// [`LocationProvider::stop_updating`].
    StopUpdating,
}

/// [`LocationProvider`] with scripted state that records every call.
#[derive(Debug)]
pub struct ScriptedLocationProvider {
    services_enabled: AtomicBool,
    status: Mutex<AuthorizationStatus>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl ScriptedLocationProvider {
    /// Provider with services enabled and the given authorization status.
    #[must_use]
    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            services_enabled: AtomicBool::new(true),
            status: Mutex::new(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose device-wide location services are switched off.
    #[must_use]
    pub fn services_disabled() -> Self {
        let provider = Self::with_status(AuthorizationStatus::NotDetermined);
        provider.services_enabled.store(false, Ordering::SeqCst);
        provider
    }

    /// Change the reported authorization status.
    pub fn set_status(&self, status: AuthorizationStatus) {
        *lock(&self.status) = status;
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        lock(&self.calls).clone()
    }
}

impl LocationProvider for ScriptedLocationProvider {
    fn services_enabled(&self) -> bool {
        self.services_enabled.load(Ordering::SeqCst)
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *lock(&self.status)
    }

    fn request_authorization(&self) {
        lock(&self.calls).push(ProviderCall::RequestAuthorization);
    }

    fn start_updating(&self) {
        lock(&self.calls).push(ProviderCall::StartUpdating);
    }

    fn stop_updating(&self) {
        lock(&self.calls).push(ProviderCall::StopUpdating);
    }
}
