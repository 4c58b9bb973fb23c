//! `[compression]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compression]
//! enable = true
//! include = ["**/*.js", "**/*.css"]
//! build = ["gzip"]               # formats in the build manifest
//! publish = ["gzip", "br"]       # formats in the publish manifest
//! min_size = 256                 # skip tiny files (bytes)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::validate_globs;
use crate::asset::AssetKind;
use crate::config::{ConfigDiagnostics, FieldPath};

/// Precompression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompressionFormat {
    #[serde(rename = "gzip")]
    Gzip,
    #[serde(rename = "br")]
    Brotli,
}

impl CompressionFormat {
    /// `Content-Encoding` value.
    pub const fn encoding(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Brotli => "br",
        }
    }

    /// File extension appended to the compressed file, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Brotli => "br",
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoding())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enable: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub build: Vec<CompressionFormat>,
    pub publish: Vec<CompressionFormat>,
    pub min_size: u64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enable: true,
            include: [
                "**/*.js", "**/*.mjs", "**/*.css", "**/*.html", "**/*.htm", "**/*.json",
                "**/*.svg", "**/*.txt", "**/*.xml", "**/*.wasm", "**/*.map",
            ]
            .map(String::from)
            .to_vec(),
            exclude: Vec::new(),
            build: vec![CompressionFormat::Gzip],
            publish: vec![CompressionFormat::Gzip, CompressionFormat::Brotli],
            min_size: 0,
        }
    }
}

impl CompressionConfig {
    /// Every format that appears in at least one phase, in a stable order.
    pub fn formats(&self) -> Vec<CompressionFormat> {
        if !self.enable {
            return Vec::new();
        }
        let mut formats: Vec<_> = self.build.iter().chain(&self.publish).copied().collect();
        formats.sort();
        formats.dedup();
        formats
    }

    /// Asset kind of a compressed variant in `format`.
    pub fn kind_of(&self, format: CompressionFormat) -> AssetKind {
        match (self.build.contains(&format), self.publish.contains(&format)) {
            (true, false) => AssetKind::Build,
            (false, true) => AssetKind::Publish,
            _ => AssetKind::All,
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(&self.include, FieldPath::new("compression.include"), diag);
        validate_globs(&self.exclude, FieldPath::new("compression.exclude"), diag);
        if self.enable && self.build.is_empty() && self.publish.is_empty() {
            diag.warn(
                FieldPath::new("compression"),
                "compression is enabled but no format is listed",
            );
        }
    }
}
