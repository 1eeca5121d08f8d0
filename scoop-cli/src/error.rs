//! Error types emitted by the Scoop CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use scoop_core::store::DocumentStoreError;
use scoop_core::{
    GeoPointError, KeywordSearchError, PostKeyError, PostRepositoryError, UnknownCategory,
};
use scoop_data::geocoding::{ClientBuildError, RegionCodeError};
use thiserror::Error;

/// Errors emitted by the Scoop CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// The category name is not one of the known categories.
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    /// Latitude or longitude lie outside their valid ranges.
    #[error(transparent)]
    InvalidCoordinate(#[from] GeoPointError),
    /// The logger could not be started.
    #[error("failed to start logging: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
    /// The async runtime could not be built.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The SQLite document store could not be opened.
    #[error("failed to open review database at {path:?}: {source}")]
    OpenDatabase {
        /// Database path.
        path: Utf8PathBuf,
        /// Store failure.
        #[source]
        source: DocumentStoreError,
    },
    /// The photo directory could not be opened.
    #[error("failed to open photo directory {path:?}: {source}")]
    OpenBlobRoot {
        /// Photo root.
        path: Utf8PathBuf,
        /// Filesystem failure.
        #[source]
        source: std::io::Error,
    },
    /// Constructing an HTTP client failed.
    #[error(transparent)]
    BuildHttpClient(#[from] ClientBuildError),
    /// A referenced input path does not exist or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be read.
    #[error("failed to read {field} path {path:?}: {source}")]
    ReadSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Filesystem failure.
        #[source]
        source: std::io::Error,
    },
    /// The store name or author cannot form a review key.
    #[error("invalid review key: {0}")]
    InvalidKey(#[from] PostKeyError),
    /// Looking up a stored review failed.
    #[error("failed to read review {path}: {source}")]
    ReadReview {
        /// Document path of the review.
        path: String,
        /// Store failure.
        #[source]
        source: DocumentStoreError,
    },
    /// A repository operation failed.
    #[error(transparent)]
    Repository(#[from] PostRepositoryError),
    /// The keyword search failed.
    #[error(transparent)]
    Search(#[from] KeywordSearchError),
    /// The region-code lookup failed.
    #[error(transparent)]
    RegionLookup(#[from] RegionCodeError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
