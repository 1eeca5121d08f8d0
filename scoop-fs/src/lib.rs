//! Capability-scoped filesystem helpers for Scoop's local adapters.
//!
//! Adapters open a single root directory with ambient authority and then do
//! all further I/O relative to that handle, so object names and cache keys
//! can never reach outside the root.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Create `path` (and any missing ancestors) and open it as a capability root.
pub fn open_root(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    ensure_dir(path)?;
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}

/// Create `path` and any missing ancestors.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    if path.as_str().is_empty() {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Reject names that are empty, absolute or climb out of their root.
pub fn check_relative(relative: &Utf8Path) -> io::Result<()> {
    if relative.as_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
    }
    let escapes = relative.components().any(|component| {
        !matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir)
    });
    if escapes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("name must stay inside its root: {relative}"),
        ));
    }
    Ok(())
}

/// Write `bytes` to `relative` under `root`, creating parent directories.
pub fn write_file(root: &fs_utf8::Dir, relative: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    check_relative(relative)?;
    if let Some(parent) = relative.parent().filter(|parent| !parent.as_str().is_empty()) {
        root.create_dir_all(parent)?;
    }
    root.write(relative, bytes)
}

/// Read `relative` under `root`, returning `None` when it does not exist.
pub fn read_optional(root: &fs_utf8::Dir, relative: &Utf8Path) -> io::Result<Option<Vec<u8>>> {
    check_relative(relative)?;
    match root.read(relative) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Remove `relative` under `root`. Returns whether a file was removed.
pub fn remove_if_exists(root: &fs_utf8::Dir, relative: &Utf8Path) -> io::Result<bool> {
    check_relative(relative)?;
    match root.remove_file(relative) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Return whether `relative` under `root` exists and is a regular file.
pub fn file_is_file(root: &fs_utf8::Dir, relative: &Utf8Path) -> io::Result<bool> {
    check_relative(relative)?;
    match root.metadata(relative) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Split a path into an ambient base directory and the suffix below it.
///
/// Absolute paths are opened from their root (or Windows drive prefix);
/// relative paths from the current directory.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();

    let (base, relative) = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;
    Ok((dir, relative))
}
