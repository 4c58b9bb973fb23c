//! Modification-time helpers.
//!
//! Timestamps only ever prove that something changed. Equality of content is
//! decided by hashes, since copies and clock skew can leave an old mtime on
//! new content.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Milliseconds since the unix epoch. Times before the epoch clamp to 0.
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Whether `path` was modified after `millis` (unix milliseconds).
///
/// Returns `false` when the mtime cannot be read.
pub fn modified_after(path: &Path, millis: u64) -> bool {
    get_mtime(path).is_some_and(|time| unix_millis(time) > millis)
}
