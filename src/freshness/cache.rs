//! Per-run memo of file content hashes.

use dashmap::DashMap;
use std::path::{Path, PathBuf};

use super::{ContentHash, compute_file_hash};

/// Concurrent cache of file hashes, owned by one tracker instance.
#[derive(Debug, Default)]
pub struct HashCache {
    hashes: DashMap<PathBuf, ContentHash>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `path`, reusing an earlier result from this run.
    pub fn hash(&self, path: &Path) -> ContentHash {
        if let Some(hash) = self.hashes.get(path) {
            return *hash;
        }
        let hash = compute_file_hash(path);
        self.hashes.insert(path.to_path_buf(), hash);
        hash
    }

    pub fn invalidate(&self, path: &Path) {
        self.hashes.remove(path);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
