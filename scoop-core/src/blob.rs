//! Binary object storage port and review photo encoding.
//!
//! Review photos are decoded from any supported format (JPEG or PNG),
//! re-encoded as JPEG at [`JPEG_COMPRESSION_QUALITY`] and uploaded under
//! `postImages/<uuid>.jpg`. Adapters resolve an uploaded object
//! to a retrieval URL which is stored on the post.

use std::fmt;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Folder holding uploaded review photos.
pub const POST_IMAGES_FOLDER: &str = "postImages";

/// Quality factor used when encoding review photos.
pub const JPEG_COMPRESSION_QUALITY: f32 = 0.8;

/// Slash-separated name of an object in a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    /// Wrap an object name, trimming surrounding slashes.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim_matches('/').to_owned())
    }

    /// Fresh, collision-free name for a review photo.
    ///
    /// # Examples
    /// ```
    /// use scoop_core::BlobPath;
    ///
    /// let path = BlobPath::post_image();
    /// assert!(path.as_str().starts_with("postImages/"));
    /// assert!(path.as_str().ends_with(".jpg"));
    /// ```
    #[must_use]
    pub fn post_image() -> Self {
        Self(format!("{POST_IMAGES_FOLDER}/{}.jpg", Uuid::new_v4()))
    }

    /// Object name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual name segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors surfaced by [`BlobStore`] implementations.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// The object name is empty or escapes the store root.
    #[error("invalid object name '{0}'")]
    InvalidPath(BlobPath),
    /// No object exists under the name.
    #[error("object '{0}' not found")]
    NotFound(BlobPath),
    /// Writing, reading or removing the object failed.
    #[error("blob storage I/O failed for '{path}': {source}")]
    Io {
        /// Affected object.
        path: BlobPath,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The backing service rejected or failed the request.
    #[error("blob storage unavailable: {message}")]
    Unavailable {
        /// Description supplied by the backend.
        message: String,
    },
    /// A blocking worker task failed to complete.
    #[error("blob storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Asynchronous access to a binary object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path`, replacing any existing object.
    async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<(), BlobStoreError>;

    /// Resolve the retrieval URL of the object at `path`.
    async fn download_url(&self, path: &BlobPath) -> Result<Url, BlobStoreError>;

    /// Remove the object at `path`. Removing a missing object succeeds.
    async fn delete(&self, path: &BlobPath) -> Result<(), BlobStoreError>;
}

/// Errors returned while encoding a review photo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageEncodeError {
    /// The image holds no data.
    #[error("image is empty")]
    Empty,
    /// The data is not an image in a supported format.
    #[error("failed to decode image: {0}")]
    Decode(String),
    /// The decoded image could not be written as JPEG.
    #[error("failed to encode image as JPEG: {0}")]
    Encode(String),
    /// The requested quality lies outside `(0, 1]`.
    #[error("JPEG quality must lie in (0, 1]")]
    InvalidQuality,
}

/// An image that can be encoded as JPEG for upload.
pub trait PostImage: Send + Sync {
    /// Encode the image as JPEG at `quality` in `(0, 1]`.
    fn encode_jpeg(&self, quality: f32) -> Result<Vec<u8>, ImageEncodeError>;
}

/// Photo bytes in any format the decoder understands, such as a camera
/// capture or a screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPhoto(Vec<u8>);

impl EncodedPhoto {
    /// Wrap encoded image bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the wrapped bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PostImage for EncodedPhoto {
    fn encode_jpeg(&self, quality: f32) -> Result<Vec<u8>, ImageEncodeError> {
        let quality = jpeg_quality(quality)?;
        if self.0.is_empty() {
            return Err(ImageEncodeError::Empty);
        }
        let decoded = image::load_from_memory(&self.0)
            .map_err(|err| ImageEncodeError::Decode(err.to_string()))?;
        let mut encoded = Vec::new();
        decoded
            .to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality))
            .map_err(|err| ImageEncodeError::Encode(err.to_string()))?;
        Ok(encoded)
    }
}

/// Map a `(0, 1]` quality factor onto the encoder's `1..=100` scale.
fn jpeg_quality(quality: f32) -> Result<u8, ImageEncodeError> {
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(ImageEncodeError::InvalidQuality);
    }
    Ok((quality * 100.0).round().clamp(1.0, 100.0) as u8)
}
