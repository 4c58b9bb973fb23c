//! Freshness detection: blake3 content hashes decide, mtimes only fast-track.
//!
//! | Module    | Purpose                                              |
//! |-----------|------------------------------------------------------|
//! | `hash`    | `ContentHash` and streaming file hashing             |
//! | `cache`   | Per-run memo of file hashes shared by rayon workers  |
//! | `mtime`   | Modification-time helpers                            |
//! | `write`   | Atomic, write-if-changed file output                 |
//! | `tracker` | Up-to-date check inputs/outputs between builds       |

mod cache;
mod hash;
pub mod mtime;
mod tracker;
mod write;

pub use cache::HashCache;
pub use hash::{ContentHash, compute_file_hash, hash_bytes};
pub use tracker::{InputChanges, Tracker, TrackerState, UpToDateCheck};
pub use write::{atomic_write, write_if_changed};
