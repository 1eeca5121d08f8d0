//! Partial-success decoding of query results into posts.
//!
//! A query batch may contain documents written by older clients or edited by
//! hand. Each document is decoded independently; documents that fail are
//! reported as [`Skipped`] entries rather than failing the whole batch.

use log::warn;

use crate::Post;
use crate::store::{Document, DocumentPath};

/// A document that could not be decoded into a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Path of the offending document.
    pub path: DocumentPath,
    /// Decoder message.
    pub reason: String,
}

/// Posts decoded from a batch together with the documents that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Successfully decoded posts, in batch order.
    pub posts: Vec<Post>,
    /// Documents that failed to decode.
    pub skipped: Vec<Skipped>,
}

impl Aggregation {
    /// Number of documents that failed to decode.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Discard the skip report and return the posts.
    #[must_use]
    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}

/// Decode every document in `documents`, keeping the ones that parse.
///
/// The result preserves input order. An empty batch yields an empty
/// aggregation.
///
/// # Examples
/// ```
/// use scoop_core::{Document, DocumentPath, aggregate};
/// use serde_json::json;
///
/// let batch = vec![Document {
///     path: DocumentPath::parse("cafe/Fritz/UserReviews/a"),
///     data: json!({"content": "missing fields"}),
/// }];
/// let result = aggregate(batch);
/// assert!(result.posts.is_empty());
/// assert_eq!(result.skipped_count(), 1);
/// ```
#[must_use]
pub fn aggregate<I>(documents: I) -> Aggregation
where
    I: IntoIterator<Item = Document>,
{
    let mut aggregation = Aggregation::default();
    for Document { path, data } in documents {
        match serde_json::from_value::<Post>(data) {
            Ok(post) => aggregation.posts.push(post),
            Err(err) => {
                warn!("event=post_skipped path={path} error={err}");
                aggregation.skipped.push(Skipped {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }
    aggregation
}
