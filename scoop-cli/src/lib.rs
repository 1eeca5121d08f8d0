//! Command-line interface for browsing and editing Scoop reviews.
//!
//! Reviews live in a local SQLite document store and photos below a local
//! directory. Place and region lookups go to the public HTTP services.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use log::debug;
use scoop_core::{PostRepository, SqliteDocumentStore};
use scoop_data::FsBlobStore;
use scoop_data::geocoding::KakaoKeywordSearch;
use serde::Serialize;
use tokio::runtime::Runtime;

mod error;
mod logging;
mod posts;
mod search;

pub use error::CliError;

use posts::{AddArgs, DeleteArgs, NearbyArgs, ReviewsArgs};
use search::{RegionsArgs, SearchArgs};

const ARG_DATABASE: &str = "database";
const ARG_BLOB_ROOT: &str = "blob-root";
const ARG_KAKAO_KEY: &str = "kakao-key";
const ARG_CATEGORY: &str = "category";
const ARG_LATITUDE: &str = "latitude";
const ARG_LONGITUDE: &str = "longitude";
const ARG_RADIUS_KM: &str = "radius-km";
const ARG_RADIUS: &str = "radius";
const ARG_STORE: &str = "store";
const ARG_AUTHOR: &str = "author";
const ARG_ADDRESS: &str = "address";
const ARG_CONTENT: &str = "content";
const ARG_PHOTO: &str = "photo";
const ARG_QUERY: &str = "query";
const ARG_PATTERN: &str = "pattern";
const ARG_LOG_LEVEL: &str = "log-level";

const ENV_LOG_LEVEL: &str = "SCOOP_LOG";

const DEFAULT_DATABASE: &str = "scoop.db";
const DEFAULT_BLOB_ROOT: &str = "blobs";

/// Run the Scoop CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let _logger = logging::init(cli.log_level.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Search(args) => search::run_search(args, &mut stdout),
        Command::Regions(args) => search::run_regions(args, &mut stdout),
        Command::Nearby(args) => posts::run_nearby(args, &mut stdout),
        Command::Reviews(args) => posts::run_reviews(args, &mut stdout),
        Command::Add(args) => posts::run_add(args, &mut stdout),
        Command::Delete(args) => posts::run_delete(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "scoop",
    about = "Browse and edit location-based store reviews",
    version
)]
struct Cli {
    /// Log filter such as `info` or `scoop_core=debug` (defaults to `warn`).
    #[arg(long = ARG_LOG_LEVEL, value_name = "spec", global = true, env = ENV_LOG_LEVEL)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search places by keyword around a coordinate.
    Search(SearchArgs),
    /// Look up administrative region codes by name pattern.
    Regions(RegionsArgs),
    /// List reviews in a category near a coordinate.
    Nearby(NearbyArgs),
    /// List reviews of one store.
    Reviews(ReviewsArgs),
    /// Add a review together with its photo.
    Add(AddArgs),
    /// Delete a review.
    Delete(DeleteArgs),
}

/// Repository over the local SQLite store, photo directory and Kakao search.
type LocalRepository = PostRepository<SqliteDocumentStore, FsBlobStore, KakaoKeywordSearch>;

/// Where reviews and photos are kept on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StorageConfig {
    database: Utf8PathBuf,
    blob_root: Utf8PathBuf,
}

impl StorageConfig {
    fn resolve(database: Option<Utf8PathBuf>, blob_root: Option<Utf8PathBuf>) -> Self {
        Self {
            database: database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            blob_root: blob_root.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_BLOB_ROOT)),
        }
    }

    /// Open the local repository.
    ///
    /// The review commands never run keyword searches, so the search
    /// client carries no API key.
    fn open(&self) -> Result<LocalRepository, CliError> {
        let documents =
            SqliteDocumentStore::open(self.database.as_std_path()).map_err(|source| {
                CliError::OpenDatabase {
                    path: self.database.clone(),
                    source,
                }
            })?;
        let blobs = FsBlobStore::open(&self.blob_root).map_err(|source| CliError::OpenBlobRoot {
            path: self.blob_root.clone(),
            source,
        })?;
        let search = KakaoKeywordSearch::new("")?;
        debug!(
            "event=repository_opened database={} blob_root={}",
            self.database,
            blobs.root()
        );
        Ok(PostRepository::new(documents, blobs, search))
    }
}

fn require<T>(value: Option<T>, field: &'static str, env: &'static str) -> Result<T, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *writer, value).map_err(CliError::SerializeOutput)?;
    writeln!(writer).map_err(CliError::WriteOutput)
}

fn read_source_file(path: &Utf8Path, field: &'static str) -> Result<Vec<u8>, CliError> {
    let read_error = |source| CliError::ReadSourceFile {
        field,
        path: path.to_path_buf(),
        source,
    };
    let (dir, relative) = scoop_fs::base_dir_and_relative(path).map_err(read_error)?;
    scoop_fs::read_optional(&dir, &relative)
        .map_err(read_error)?
        .ok_or_else(|| CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests;
