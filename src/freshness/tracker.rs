//! Incremental up-to-date tracking between builds.
//!
//! The tracker persists the inputs (path, blake3 hash, size) and outputs of
//! the last successful build. A later build compares the current input set
//! against it:
//!
//! - added / removed: set difference
//! - modified: content hash differs
//!
//! Inputs whose mtime is newer than the recorded build are hashed first, so
//! an edited file is usually confirmed dirty without hashing the rest.
//!
//! Removed files cannot be timestamped, so a sentinel file is rewritten with
//! their paths and takes their place in the input set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::mtime::{modified_after, unix_millis};
use super::{ContentHash, HashCache, atomic_write};
use crate::debug;

const STATE_VERSION: u32 = 1;

/// One recorded input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputRecord {
    pub hash: String,
    pub size: u64,
}

/// Persisted state of the last successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackerState {
    pub version: u32,
    /// Unix milliseconds at which the recorded build started.
    pub started_at: u64,
    pub inputs: BTreeMap<PathBuf, InputRecord>,
    pub outputs: Vec<PathBuf>,
}

/// Difference between the recorded and the current input set.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InputChanges {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl InputChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Input and output sets handed to the build system.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UpToDateCheck {
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

pub struct Tracker {
    state_path: PathBuf,
    marker_path: PathBuf,
    previous: Option<TrackerState>,
    cache: HashCache,
    started_at: u64,
}

impl Tracker {
    /// Load the recorded state. A missing, unreadable or outdated state file
    /// means "never built".
    pub fn load(state_path: &Path, marker_path: &Path) -> Self {
        let started_at = unix_millis(SystemTime::now());
        let previous = fs::read(state_path)
            .ok()
            .and_then(|bytes| match serde_json::from_slice::<TrackerState>(&bytes) {
                Ok(state) if state.version == STATE_VERSION => Some(state),
                Ok(_) => {
                    debug!("tracker"; "state version changed, rebuilding");
                    None
                }
                Err(e) => {
                    debug!("tracker"; "ignoring unreadable state: {}", e);
                    None
                }
            });

        Self {
            state_path: state_path.to_path_buf(),
            marker_path: marker_path.to_path_buf(),
            previous,
            cache: HashCache::new(),
            started_at,
        }
    }

    pub fn previous(&self) -> Option<&TrackerState> {
        self.previous.as_ref()
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Compare `inputs` against the recorded state.
    ///
    /// Without a recorded state every input counts as added.
    pub fn check(&self, inputs: &[PathBuf]) -> InputChanges {
        let Some(previous) = &self.previous else {
            return InputChanges {
                added: inputs.to_vec(),
                ..Default::default()
            };
        };

        let mut changes = InputChanges::default();
        let mut kept = Vec::new();
        for input in inputs {
            if previous.inputs.contains_key(input) {
                kept.push(input);
            } else if input != &self.marker_path {
                changes.added.push(input.clone());
            }
        }
        changes.removed = previous
            .inputs
            .keys()
            .filter(|path| *path != &self.marker_path && !inputs.contains(path))
            .cloned()
            .collect();

        // Recently touched files first: one confirmed edit settles the check.
        let (touched, untouched): (Vec<&PathBuf>, Vec<&PathBuf>) = kept
            .into_iter()
            .partition(|path| modified_after(path, previous.started_at));

        changes.modified = self.modified_among(&touched, previous);
        if changes.modified.is_empty() && changes.added.is_empty() && changes.removed.is_empty() {
            changes.modified = self.modified_among(&untouched, previous);
        }
        changes.modified.sort();
        changes
    }

    fn modified_among(&self, paths: &[&PathBuf], previous: &TrackerState) -> Vec<PathBuf> {
        paths
            .par_iter()
            .filter(|path| {
                let recorded = &previous.inputs[**path];
                self.cache.hash(path).to_hex() != recorded.hash
            })
            .map(|path| (*path).clone())
            .collect()
    }

    /// True when nothing changed and every recorded output still exists.
    pub fn is_up_to_date(&self, changes: &InputChanges) -> bool {
        match &self.previous {
            Some(previous) => {
                changes.is_empty() && previous.outputs.iter().all(|output| output.exists())
            }
            None => false,
        }
    }

    /// Final input set for this build. Rewrites the sentinel when inputs were
    /// removed and substitutes it for them.
    pub fn input_set(&self, inputs: &[PathBuf], changes: &InputChanges) -> Result<Vec<PathBuf>> {
        if !changes.removed.is_empty() {
            let listing: String = changes
                .removed
                .iter()
                .map(|path| format!("{}\n", path.display()))
                .collect();
            atomic_write(&self.marker_path, listing.as_bytes())
                .with_context(|| format!("failed to write {}", self.marker_path.display()))?;
            debug!("tracker"; "{} inputs removed", changes.removed.len());
        }

        let mut set: Vec<PathBuf> = inputs
            .iter()
            .filter(|path| *path != &self.marker_path)
            .cloned()
            .collect();
        if self.marker_path.is_file() {
            set.push(self.marker_path.clone());
        }
        set.sort();
        Ok(set)
    }

    /// Persist `check` as the state of a successful build.
    pub fn record(&self, check: &UpToDateCheck) -> Result<()> {
        // Files edited by the build itself must be hashed fresh.
        self.cache.invalidate(&self.marker_path);

        let inputs: BTreeMap<PathBuf, InputRecord> = check
            .inputs
            .par_iter()
            .filter_map(|path| {
                let size = fs::metadata(path).ok()?.len();
                let hash = self.cache.hash(path);
                (!hash.is_empty() || size == 0).then(|| (path.clone(), record_of(hash, size)))
            })
            .collect();

        let state = TrackerState {
            version: STATE_VERSION,
            started_at: self.started_at,
            inputs,
            outputs: check.outputs.clone(),
        };
        let json = serde_json::to_vec_pretty(&state)?;
        atomic_write(&self.state_path, &json)
            .with_context(|| format!("failed to write {}", self.state_path.display()))
    }
}

fn record_of(hash: ContentHash, size: u64) -> InputRecord {
    InputRecord {
        hash: hash.to_hex(),
        size,
    }
}
