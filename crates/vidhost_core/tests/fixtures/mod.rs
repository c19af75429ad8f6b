use std::path::PathBuf;

use tempfile::TempDir;
use vidhost_core::{FileStore, PreferenceStore};

/// A file-backed store rooted in a fresh temporary directory. Keep the
/// returned `TempDir` alive for as long as the store is used.
pub fn file_store() -> (TempDir, PreferenceStore<FileStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = reopen(dir.path().to_path_buf());
    (dir, store)
}

pub fn reopen(root: PathBuf) -> PreferenceStore<FileStore> {
    PreferenceStore::new(FileStore::open(root).unwrap())
}
