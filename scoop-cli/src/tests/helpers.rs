//! Test helpers for building repositories and input files.

use super::*;
use scoop_core::MemoryDocumentStore;
use scoop_core::test_support::{MemoryBlobStore, StubKeywordSearch};
use std::fs;

pub(super) type MemoryRepository =
    PostRepository<MemoryDocumentStore, MemoryBlobStore, StubKeywordSearch>;

pub(super) fn memory_repository() -> MemoryRepository {
    PostRepository::new(
        MemoryDocumentStore::new(),
        MemoryBlobStore::new(),
        StubKeywordSearch::default(),
    )
}

pub(super) fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
}

pub(super) fn write_utf8(path: &Utf8Path, bytes: &[u8]) {
    fs::write(path.as_std_path(), bytes).expect("write test file");
}
