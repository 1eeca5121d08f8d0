//! Review commands: `nearby`, `reviews`, `add` and `delete`.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use scoop_core::{
    Aggregation, BlobStore, DocumentStore, EncodedPhoto, GeoPoint, KeywordSearch, Post, PostCategory,
    PostKey, PostRepository,
};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ADDRESS, ARG_AUTHOR, ARG_BLOB_ROOT, ARG_CATEGORY, ARG_CONTENT, ARG_DATABASE,
    ARG_LATITUDE, ARG_LONGITUDE, ARG_PHOTO, ARG_RADIUS_KM, ARG_STORE, CliError, StorageConfig,
    require, runtime, write_json,
};

pub(crate) const ENV_NEARBY_CATEGORY: &str = "SCOOP_CMDS_NEARBY_CATEGORY";
pub(crate) const ENV_NEARBY_LATITUDE: &str = "SCOOP_CMDS_NEARBY_LATITUDE";
pub(crate) const ENV_NEARBY_LONGITUDE: &str = "SCOOP_CMDS_NEARBY_LONGITUDE";
pub(crate) const ENV_REVIEWS_STORE: &str = "SCOOP_CMDS_REVIEWS_STORE";
pub(crate) const ENV_REVIEWS_CATEGORY: &str = "SCOOP_CMDS_REVIEWS_CATEGORY";
pub(crate) const ENV_ADD_AUTHOR: &str = "SCOOP_CMDS_ADD_AUTHOR";
pub(crate) const ENV_ADD_STORE: &str = "SCOOP_CMDS_ADD_STORE";
pub(crate) const ENV_ADD_CATEGORY: &str = "SCOOP_CMDS_ADD_CATEGORY";
pub(crate) const ENV_ADD_LATITUDE: &str = "SCOOP_CMDS_ADD_LATITUDE";
pub(crate) const ENV_ADD_LONGITUDE: &str = "SCOOP_CMDS_ADD_LONGITUDE";
pub(crate) const ENV_ADD_PHOTO: &str = "SCOOP_CMDS_ADD_PHOTO";
pub(crate) const ENV_DELETE_AUTHOR: &str = "SCOOP_CMDS_DELETE_AUTHOR";
pub(crate) const ENV_DELETE_STORE: &str = "SCOOP_CMDS_DELETE_STORE";
pub(crate) const ENV_DELETE_CATEGORY: &str = "SCOOP_CMDS_DELETE_CATEGORY";

const DEFAULT_RADIUS_KM: f64 = 1.0;

/// CLI arguments for the `nearby` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List reviews in a category near a coordinate")]
#[ortho_config(prefix = "SCOOP")]
pub(crate) struct NearbyArgs {
    /// Store category (for example `cafe` or `restaurant`).
    #[arg(long = ARG_CATEGORY, value_name = "name")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) latitude: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) longitude: Option<f64>,
    /// Search radius in kilometres (defaults to 1).
    #[arg(long = ARG_RADIUS_KM, value_name = "km", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) radius_km: Option<f64>,
    /// SQLite review database (defaults to `scoop.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Photo directory (defaults to `blobs`).
    #[arg(long = ARG_BLOB_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) blob_root: Option<Utf8PathBuf>,
}

/// Resolved `nearby` configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearbyConfig {
    pub(crate) category: PostCategory,
    pub(crate) center: GeoPoint,
    pub(crate) radius_km: f64,
    pub(crate) storage: StorageConfig,
}

impl TryFrom<NearbyArgs> for NearbyConfig {
    type Error = CliError;

    fn try_from(args: NearbyArgs) -> Result<Self, Self::Error> {
        let category = require(args.category, ARG_CATEGORY, ENV_NEARBY_CATEGORY)?
            .parse::<PostCategory>()?;
        let latitude = require(args.latitude, ARG_LATITUDE, ENV_NEARBY_LATITUDE)?;
        let longitude = require(args.longitude, ARG_LONGITUDE, ENV_NEARBY_LONGITUDE)?;
        Ok(Self {
            category,
            center: GeoPoint::new(latitude, longitude)?,
            radius_km: args.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
            storage: StorageConfig::resolve(args.database, args.blob_root),
        })
    }
}

/// CLI arguments for the `reviews` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List reviews of one store")]
#[ortho_config(prefix = "SCOOP")]
pub(crate) struct ReviewsArgs {
    /// Exact store name.
    #[arg(long = ARG_STORE, value_name = "name")]
    #[serde(default)]
    pub(crate) store: Option<String>,
    /// Store category.
    #[arg(long = ARG_CATEGORY, value_name = "name")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// SQLite review database (defaults to `scoop.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Photo directory (defaults to `blobs`).
    #[arg(long = ARG_BLOB_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) blob_root: Option<Utf8PathBuf>,
}

/// Resolved `reviews` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReviewsConfig {
    pub(crate) store: String,
    pub(crate) category: PostCategory,
    pub(crate) storage: StorageConfig,
}

impl TryFrom<ReviewsArgs> for ReviewsConfig {
    type Error = CliError;

    fn try_from(args: ReviewsArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            store: require(args.store, ARG_STORE, ENV_REVIEWS_STORE)?,
            category: require(args.category, ARG_CATEGORY, ENV_REVIEWS_CATEGORY)?
                .parse::<PostCategory>()?,
            storage: StorageConfig::resolve(args.database, args.blob_root),
        })
    }
}

/// CLI arguments for the `add` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Re-encode a JPEG or PNG photo as JPEG, upload it into the \
                 photo directory and store the review with the photo's URL \
                 attached. The review replaces any earlier review by the \
                 same author of the same store.",
    about = "Add a review together with its photo"
)]
#[ortho_config(prefix = "SCOOP")]
pub(crate) struct AddArgs {
    /// Identifier of the reviewing account.
    #[arg(long = ARG_AUTHOR, value_name = "uid")]
    #[serde(default)]
    pub(crate) author: Option<String>,
    /// Name of the reviewed store.
    #[arg(long = ARG_STORE, value_name = "name")]
    #[serde(default)]
    pub(crate) store: Option<String>,
    /// Store category.
    #[arg(long = ARG_CATEGORY, value_name = "name")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Latitude of the store in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) latitude: Option<f64>,
    /// Longitude of the store in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) longitude: Option<f64>,
    /// Road address of the store.
    #[arg(long = ARG_ADDRESS, value_name = "text")]
    #[serde(default)]
    pub(crate) address: Option<String>,
    /// Review text.
    #[arg(long = ARG_CONTENT, value_name = "text")]
    #[serde(default)]
    pub(crate) content: Option<String>,
    /// JPEG or PNG photo to upload.
    #[arg(long = ARG_PHOTO, value_name = "path")]
    #[serde(default)]
    pub(crate) photo: Option<Utf8PathBuf>,
    /// SQLite review database (defaults to `scoop.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Photo directory (defaults to `blobs`).
    #[arg(long = ARG_BLOB_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) blob_root: Option<Utf8PathBuf>,
}

/// Resolved `add` configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AddConfig {
    pub(crate) post: Post,
    pub(crate) photo: Utf8PathBuf,
    pub(crate) storage: StorageConfig,
}

impl TryFrom<AddArgs> for AddConfig {
    type Error = CliError;

    fn try_from(args: AddArgs) -> Result<Self, Self::Error> {
        let author_uid = require(args.author, ARG_AUTHOR, ENV_ADD_AUTHOR)?;
        let store_name = require(args.store, ARG_STORE, ENV_ADD_STORE)?;
        let category = require(args.category, ARG_CATEGORY, ENV_ADD_CATEGORY)?
            .parse::<PostCategory>()?;
        let latitude = require(args.latitude, ARG_LATITUDE, ENV_ADD_LATITUDE)?;
        let longitude = require(args.longitude, ARG_LONGITUDE, ENV_ADD_LONGITUDE)?;
        let photo = require(args.photo, ARG_PHOTO, ENV_ADD_PHOTO)?;
        let post = Post {
            author_uid,
            store_name,
            category,
            address: args.address.unwrap_or_default(),
            location: GeoPoint::new(latitude, longitude)?,
            post_image: None,
            content: args.content.unwrap_or_default(),
        };
        Ok(Self {
            post,
            photo,
            storage: StorageConfig::resolve(args.database, args.blob_root),
        })
    }
}

/// CLI arguments for the `delete` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Delete a review")]
#[ortho_config(prefix = "SCOOP")]
pub(crate) struct DeleteArgs {
    /// Identifier of the reviewing account.
    #[arg(long = ARG_AUTHOR, value_name = "uid")]
    #[serde(default)]
    pub(crate) author: Option<String>,
    /// Name of the reviewed store.
    #[arg(long = ARG_STORE, value_name = "name")]
    #[serde(default)]
    pub(crate) store: Option<String>,
    /// Store category.
    #[arg(long = ARG_CATEGORY, value_name = "name")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// SQLite review database (defaults to `scoop.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Photo directory (defaults to `blobs`).
    #[arg(long = ARG_BLOB_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) blob_root: Option<Utf8PathBuf>,
}

/// Resolved `delete` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeleteConfig {
    pub(crate) author: String,
    pub(crate) store: String,
    pub(crate) category: PostCategory,
    pub(crate) storage: StorageConfig,
}

impl TryFrom<DeleteArgs> for DeleteConfig {
    type Error = CliError;

    fn try_from(args: DeleteArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            author: require(args.author, ARG_AUTHOR, ENV_DELETE_AUTHOR)?,
            store: require(args.store, ARG_STORE, ENV_DELETE_STORE)?,
            category: require(args.category, ARG_CATEGORY, ENV_DELETE_CATEGORY)?
                .parse::<PostCategory>()?,
            storage: StorageConfig::resolve(args.database, args.blob_root),
        })
    }
}

/// Outcome printed by `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DeleteOutcome {
    pub(crate) deleted: bool,
}

pub(super) fn run_nearby(args: NearbyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = NearbyConfig::try_from(merged)?;
    let repository = config.storage.open()?;
    let posts = runtime()?.block_on(execute_nearby(&repository, &config))?;
    write_json(writer, &posts)
}

pub(super) fn run_reviews(args: ReviewsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ReviewsConfig::try_from(merged)?;
    let repository = config.storage.open()?;
    let posts = runtime()?.block_on(execute_reviews(&repository, &config))?;
    write_json(writer, &posts)
}

pub(super) fn run_add(args: AddArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = AddConfig::try_from(merged)?;
    let photo = EncodedPhoto::new(crate::read_source_file(&config.photo, ARG_PHOTO)?);
    let repository = config.storage.open()?;
    let stored = runtime()?.block_on(repository.add_post(&config.post, &photo))?;
    write_json(writer, &stored)
}

pub(super) fn run_delete(args: DeleteArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = DeleteConfig::try_from(merged)?;
    let repository = config.storage.open()?;
    let outcome = runtime()?.block_on(execute_delete(&repository, &config))?;
    write_json(writer, &outcome)
}

pub(super) async fn execute_nearby<D, B, S>(
    repository: &PostRepository<D, B, S>,
    config: &NearbyConfig,
) -> Result<Vec<Post>, CliError>
where
    D: DocumentStore,
    B: BlobStore,
    S: KeywordSearch,
{
    let found = repository
        .fetch_posts_around_coordinate(config.category, config.center, config.radius_km)
        .await?;
    Ok(report_skipped(found))
}

pub(super) async fn execute_reviews<D, B, S>(
    repository: &PostRepository<D, B, S>,
    config: &ReviewsConfig,
) -> Result<Vec<Post>, CliError>
where
    D: DocumentStore,
    B: BlobStore,
    S: KeywordSearch,
{
    let found = repository
        .fetch_posts_store(&config.store, config.category)
        .await?;
    Ok(report_skipped(found))
}

/// Delete the author's review of the store, if there is one.
///
/// The review is looked up by key, so a stored document that no longer
/// decodes as a review can still be removed.
pub(super) async fn execute_delete<D, B, S>(
    repository: &PostRepository<D, B, S>,
    config: &DeleteConfig,
) -> Result<DeleteOutcome, CliError>
where
    D: DocumentStore,
    B: BlobStore,
    S: KeywordSearch,
{
    let key = PostKey::new(config.category, &config.store, &config.author)?;
    let path = key.document_path();
    let existing = repository
        .documents()
        .get_document(&path)
        .await
        .map_err(|source| CliError::ReadReview {
            path: path.to_string(),
            source,
        })?;
    if existing.is_none() {
        info!(
            "event=delete_skipped store={} author={}",
            config.store, config.author
        );
        return Ok(DeleteOutcome { deleted: false });
    }
    repository.delete_post_at(&key).await?;
    Ok(DeleteOutcome { deleted: true })
}

fn report_skipped(found: Aggregation) -> Vec<Post> {
    for skipped in &found.skipped {
        warn!(
            "event=review_unreadable path={} reason={}",
            skipped.path, skipped.reason
        );
    }
    found.into_posts()
}
