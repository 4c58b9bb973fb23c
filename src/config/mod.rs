//! Project configuration management for `swa.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── project    # [project]
//! │   ├── discovery  # [discovery]
//! │   ├── fingerprint# [fingerprint]
//! │   ├── compression# [compression]
//! │   ├── reference  # [[references]]
//! │   └── items      # [[assets]], [[copy]]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! The loaded config is immutable and handed to every pipeline stage by
//! reference. Unknown keys are reported and ignored.

pub mod section;
pub mod types;
mod util;

pub use section::{
    AssetItemConfig, CompressionConfig, CompressionFormat, CopyItemConfig, DiscoveryConfig,
    FingerprintConfig, FingerprintPattern, ProjectSectionConfig, ReferenceConfig, ReferenceKind,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::asset::ManifestType;
use crate::log;
use crate::utils::path::{normalize_path, resolve_path};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Root configuration structure representing swa.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub project: ProjectSectionConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub references: Vec<ReferenceConfig>,

    #[serde(default)]
    pub assets: Vec<AssetItemConfig>,

    #[serde(default)]
    pub copy: Vec<CopyItemConfig>,
}

impl ProjectConfig {
    /// Locate (searching upward from cwd), parse and validate a config file.
    pub fn load(config_name: &Path) -> Result<Self> {
        let config_path = find_config_file(config_name)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;
        Self::load_from(&config_path)
    }

    /// Parse and validate the config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_path(path)?;
        config.config_path = normalize_path(path);
        config.root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Validate every section, print warnings and fail on errors.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.project.validate(&mut diag);
        self.discovery.validate(&mut diag);
        self.fingerprint.validate(&mut diag);
        self.compression.validate(&mut diag);
        ReferenceConfig::validate_all(&self.references, &self.project.name, &mut diag);
        AssetItemConfig::validate_all(&self.assets, &mut diag);
        CopyItemConfig::validate_all(&self.copy, &mut diag);

        if !self.content_root().is_dir() {
            diag.warn(
                FieldPath::new("project.content_root"),
                format!("`{}` does not exist", self.project.content_root.display()),
            );
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    /// Resolve a configured path against the project directory.
    pub fn root_join(&self, path: &Path) -> PathBuf {
        resolve_path(path, &self.root)
    }

    pub fn content_root(&self) -> PathBuf {
        self.root_join(&self.project.content_root)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_join(&self.project.output)
    }

    pub fn output_wwwroot(&self) -> PathBuf {
        self.root_join(&self.project.output_wwwroot)
    }

    /// Directory holding precompressed variants.
    pub fn compressed_dir(&self) -> PathBuf {
        self.output_dir().join("compressed")
    }

    /// `<output>/<name>.staticwebassets.<build|publish>.json`
    pub fn manifest_path(&self, phase: ManifestType) -> PathBuf {
        self.output_dir()
            .join(crate::manifest::manifest_file_name(&self.project.name, phase))
    }

    pub fn runtime_manifest_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}.staticwebassets.runtime.json", self.project.name))
    }

    pub fn state_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}.staticwebassets.state.json", self.project.name))
    }

    /// Sentinel input standing in for every removed file.
    pub fn removed_marker_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}.staticwebassets.removed", self.project.name))
    }
}

/// Parse a config snippet for tests. Fails on unknown fields.
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> ProjectConfig {
    let config = format!("[project]\nname = \"App\"\n{extra}");
    let config = if extra.trim_start().starts_with("[project]") {
        extra.to_string()
    } else {
        config
    };
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_config() {
        let config = test_parse_config("");
        assert_eq!(config.project.name, "App");
        assert!(config.references.is_empty());
        assert!(config.assets.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) =
            ProjectConfig::parse_with_ignored("[project]\nname = \"App\"\ncolour = 1\n[extra]\nx = 1")
                .unwrap();
        assert_eq!(ignored.len(), 2);
        assert!(ignored.contains(&"project.colour".to_string()));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ProjectConfig::parse_with_ignored("[project\nname=").is_err());
    }

    #[test]
    fn test_load_from_resolves_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("wwwroot")).unwrap();
        let path = dir.path().join("swa.toml");
        fs::write(&path, "[project]\nname = \"App\"\n").unwrap();

        let config = ProjectConfig::load_from(&path).unwrap();
        assert_eq!(config.root, normalize_path(dir.path()));
        assert_eq!(config.content_root(), config.root.join("wwwroot"));
        assert!(
            config
                .manifest_path(ManifestType::Build)
                .ends_with("obj/staticwebassets/App.staticwebassets.build.json")
        );
        assert!(
            config
                .manifest_path(ManifestType::Publish)
                .ends_with("App.staticwebassets.publish.json")
        );
    }

    #[test]
    fn test_load_from_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("swa.toml");
        fs::write(&path, "[project]\nname = \"\"\n").unwrap();

        let err = ProjectConfig::load_from(&path).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
