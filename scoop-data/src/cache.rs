//! File-backed key-value cache for small JSON values.
//!
//! Each key is stored as `<key>.json` inside the cache directory. Values that
//! no longer decode (for example after a schema change) read back as absent
//! rather than as an error.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use log::{info, warn};
use scoop_core::{CachedUserLocation, USER_LOCATION_CACHE_KEY};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors returned by [`FileKeyValueCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is empty or contains characters unsafe in a file name.
    #[error("invalid cache key '{0}'")]
    InvalidKey(String),
    /// The value could not be serialised.
    #[error("failed to encode cached value for '{key}': {source}")]
    Encode {
        /// Cache key.
        key: String,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// Reading or writing the cache directory failed.
    #[error("cache I/O failed for '{key}': {source}")]
    Io {
        /// Cache key.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Persistent key-value cache in a directory.
#[derive(Debug)]
pub struct FileKeyValueCache {
    root: Utf8PathBuf,
    dir: Dir,
}

impl FileKeyValueCache {
    /// Open (creating if needed) a cache in `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or opened.
    pub fn open(root: impl AsRef<Utf8Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let dir = scoop_fs::open_root(&root)?;
        Ok(Self { root, dir })
    }

    /// Cache directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let file = file_name(key)?;
        let bytes = serde_json::to_vec(value).map_err(|source| CacheError::Encode {
            key: key.to_owned(),
            source,
        })?;
        scoop_fs::write_file(&self.dir, &file, &bytes).map_err(|source| io_error(key, source))?;
        info!("event=cache_saved key={key}");
        Ok(())
    }

    /// Load the value stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored or the stored value does not
    /// decode as `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let file = file_name(key)?;
        let Some(bytes) =
            scoop_fs::read_optional(&self.dir, &file).map_err(|source| io_error(key, source))?
        else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("event=cache_unreadable key={key} error={err}");
                Ok(None)
            }
        }
    }

    /// Remove the value stored under `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let file = file_name(key)?;
        scoop_fs::remove_if_exists(&self.dir, &file).map_err(|source| io_error(key, source))
    }

    /// Persist the last-known user location under `key`.
    pub fn save_user_location(
        &self,
        location: &CachedUserLocation,
        key: &str,
    ) -> Result<(), CacheError> {
        self.save(key, location)
    }

    /// Last-known user location stored under `key`, if readable.
    pub fn cached_user_location(
        &self,
        key: &str,
    ) -> Result<Option<CachedUserLocation>, CacheError> {
        self.load(key)
    }

    /// Last-known user location stored under the default key.
    pub fn default_user_location(&self) -> Result<Option<CachedUserLocation>, CacheError> {
        self.cached_user_location(USER_LOCATION_CACHE_KEY)
    }
}

fn file_name(key: &str) -> Result<Utf8PathBuf, CacheError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if !valid {
        return Err(CacheError::InvalidKey(key.to_owned()));
    }
    Ok(Utf8PathBuf::from(format!("{key}.json")))
}

fn io_error(key: &str, source: io::Error) -> CacheError {
    CacheError::Io {
        key: key.to_owned(),
        source,
    }
}
