//! The static web assets manifest: one document per project and phase.
//!
//! | Module    | Purpose                                                   |
//! |-----------|-----------------------------------------------------------|
//! | `builder` | Filter, resolve, define endpoints, sort, hash             |
//! | `merge`   | Fold in the manifests of referenced projects and packages |
//! | `runtime` | Path-tree view of the build manifest for dev-time serving |

mod builder;
mod merge;
mod runtime;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::ConflictError;
use crate::asset::{AssetError, ManifestType, SourceType, StaticAsset};
use crate::endpoint::{EndpointError, StaticAssetEndpoint};
use crate::freshness::write_if_changed;

pub use builder::ManifestBuilder;
pub use merge::{MergedReferences, merge_references, reference_manifest_path};
pub use runtime::{RuntimeManifest, RuntimeNode};

/// Schema version written to and expected from manifests.
pub const MANIFEST_VERSION: u32 = 1;

/// `<name>.staticwebassets.<build|publish>.json`
pub fn manifest_file_name(name: &str, phase: ManifestType) -> String {
    format!("{name}.staticwebassets.{phase}.json")
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest of referenced project `{project}` not found at {}", path.display())]
    MissingReference { project: String, path: PathBuf },

    #[error("manifest of referenced project `{project}` at {} is malformed: {reason}", path.display())]
    MalformedReference {
        project: String,
        path: PathBuf,
        reason: String,
    },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A glob rule design-time tooling uses to rediscover assets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoveryPattern {
    pub name: String,
    pub source: String,
    pub content_root: String,
    pub base_path: String,
    pub pattern: String,
}

/// A manifest merged into this one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReferencedProjectConfiguration {
    /// Path of the referenced manifest.
    pub identity: String,
    pub source_id: String,
    pub source_type: SourceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StaticWebAssetsManifest {
    pub version: u32,
    pub hash: String,
    pub source: String,
    pub manifest_type: ManifestType,
    #[serde(default)]
    pub referenced_projects_configuration: Vec<ReferencedProjectConfiguration>,
    #[serde(default)]
    pub discovery_patterns: Vec<DiscoveryPattern>,
    #[serde(default)]
    pub assets: Vec<StaticAsset>,
    #[serde(default)]
    pub endpoints: Vec<StaticAssetEndpoint>,
}

impl StaticWebAssetsManifest {
    /// Serialized form, as written to disk.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        Ok(json)
    }

    /// Write the manifest unless the file already holds identical bytes.
    /// Returns whether it wrote.
    pub fn write(&self, path: &Path) -> Result<bool, ManifestError> {
        let json = self.to_json()?;
        write_if_changed(path, &json).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = fs::read(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_file_name() {
        assert_eq!(
            manifest_file_name("App", ManifestType::Build),
            "App.staticwebassets.build.json"
        );
        assert_eq!(
            manifest_file_name("App", ManifestType::Publish),
            "App.staticwebassets.publish.json"
        );
    }

    #[test]
    fn test_top_level_fields() {
        let manifest = StaticWebAssetsManifest {
            version: MANIFEST_VERSION,
            hash: "abc".to_string(),
            source: "App".to_string(),
            manifest_type: ManifestType::Publish,
            referenced_projects_configuration: Vec::new(),
            discovery_patterns: Vec::new(),
            assets: Vec::new(),
            endpoints: Vec::new(),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&manifest.to_json().unwrap()).unwrap();
        for field in [
            "Version",
            "Hash",
            "Assets",
            "Endpoints",
            "DiscoveryPatterns",
            "ReferencedProjectsConfiguration",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["ManifestType"], "Publish");
    }
}
