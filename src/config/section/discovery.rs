//! `[discovery]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [discovery]
//! include = ["**"]
//! exclude = ["**/*.scss", "**/.DS_Store"]
//! mode = "All"           # AssetMode of discovered assets
//! kind = "Build"         # optional AssetKind override
//! ```

use serde::{Deserialize, Serialize};

use super::validate_globs;
use crate::asset::{AssetKind, AssetMode};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub mode: AssetMode,
    pub kind: Option<AssetKind>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            include: vec!["**".to_string()],
            exclude: Vec::new(),
            mode: AssetMode::All,
            kind: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.include.is_empty() {
            diag.warn(
                FieldPath::new("discovery.include"),
                "no include patterns, nothing will be discovered",
            );
        }
        validate_globs(&self.include, FieldPath::new("discovery.include"), diag);
        validate_globs(&self.exclude, FieldPath::new("discovery.exclude"), diag);
    }
}
