//! The `StaticAsset` record.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::integrity::digest_file;
use super::kind::{AssetKind, AssetMode, AssetRole, CopyOption, SourceType};
use super::pattern::{FINGERPRINT_TOKEN, PathPattern, PatternError, ResolvedPath, TokenSource};
use crate::utils::path::{base_path_or_root, content_root_string, join_route, normalize_route};

/// Trait name marking a precompressed alternative.
pub const CONTENT_ENCODING: &str = "Content-Encoding";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid static web asset `{identity}`: {reason}")]
    Invalid { identity: String, reason: String },

    #[error("failed to read `{identity}`")]
    Io {
        identity: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// One static file tracked by the manifest.
///
/// `identity` is the absolute file path and is unique within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StaticAsset {
    pub identity: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub content_root: String,
    pub base_path: String,
    pub relative_path: String,
    pub asset_kind: AssetKind,
    pub asset_mode: AssetMode,
    pub asset_role: AssetRole,
    #[serde(default)]
    pub related_asset: String,
    #[serde(default)]
    pub asset_trait_name: String,
    #[serde(default)]
    pub asset_trait_value: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub integrity: String,
    pub copy_to_output_directory: CopyOption,
    pub copy_to_publish_directory: CopyOption,
    #[serde(default)]
    pub file_length: u64,
    #[serde(default)]
    pub last_write_time: String,
}

impl StaticAsset {
    /// A primary asset with default metadata. Content fields stay empty
    /// until [`StaticAsset::apply_defaults`] runs.
    pub fn new(
        identity: impl Into<String>,
        source_id: impl Into<String>,
        source_type: SourceType,
        content_root: &Path,
        base_path: &str,
        relative_path: &str,
    ) -> Self {
        let copy_to_publish = CopyOption::PreserveNewest;
        Self {
            identity: identity.into(),
            source_id: source_id.into(),
            source_type,
            content_root: content_root_string(content_root),
            base_path: base_path_or_root(base_path),
            relative_path: normalize_route(relative_path),
            asset_kind: AssetKind::from_copy_options(copy_to_publish),
            asset_mode: AssetMode::All,
            asset_role: AssetRole::Primary,
            related_asset: String::new(),
            asset_trait_name: String::new(),
            asset_trait_value: String::new(),
            fingerprint: String::new(),
            integrity: String::new(),
            copy_to_output_directory: CopyOption::Never,
            copy_to_publish_directory: copy_to_publish,
            file_length: 0,
            last_write_time: String::new(),
        }
    }

    /// Fill content-derived fields that are still empty by reading the file.
    pub fn apply_defaults(&mut self) -> Result<(), AssetError> {
        if !self.fingerprint.is_empty()
            && !self.integrity.is_empty()
            && !self.last_write_time.is_empty()
        {
            return Ok(());
        }
        let file = digest_file(Path::new(&self.identity)).map_err(|source| AssetError::Io {
            identity: self.identity.clone(),
            source,
        })?;
        if self.fingerprint.is_empty() {
            self.fingerprint = file.digest.fingerprint;
        }
        if self.integrity.is_empty() {
            self.integrity = file.digest.integrity;
        }
        if self.last_write_time.is_empty() {
            self.last_write_time = file.last_write_time;
            self.file_length = file.length;
        }
        Ok(())
    }

    /// Canonicalize separators and empty values.
    pub fn normalize(&mut self) {
        self.relative_path = normalize_route(&self.relative_path);
        self.base_path = base_path_or_root(&self.base_path);
        self.content_root = content_root_string(Path::new(&self.content_root));
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        let invalid = |reason: &str| AssetError::Invalid {
            identity: self.identity.clone(),
            reason: reason.to_string(),
        };

        if self.identity.is_empty() {
            return Err(invalid("identity is empty"));
        }
        for (value, field) in [
            (&self.source_id, "SourceId"),
            (&self.content_root, "ContentRoot"),
            (&self.base_path, "BasePath"),
            (&self.relative_path, "RelativePath"),
            (&self.fingerprint, "Fingerprint"),
            (&self.integrity, "Integrity"),
        ] {
            if value.is_empty() {
                return Err(invalid(&format!("{field} is required")));
            }
        }
        if self.asset_role != AssetRole::Primary && self.related_asset.is_empty() {
            return Err(invalid("a related or alternative asset needs RelatedAsset"));
        }
        if self.asset_role == AssetRole::Alternative
            && (self.asset_trait_name.is_empty() || self.asset_trait_value.is_empty())
        {
            return Err(invalid(
                "an alternative asset needs AssetTraitName and AssetTraitValue",
            ));
        }
        PathPattern::parse(&self.relative_path)?;
        Ok(())
    }

    pub fn is_primary(&self) -> bool {
        self.asset_role == AssetRole::Primary
    }

    /// Precompressed variant of another asset.
    pub fn is_compressed(&self) -> bool {
        self.asset_trait_name == CONTENT_ENCODING
    }

    pub fn pattern(&self) -> Result<PathPattern, PatternError> {
        PathPattern::parse(&self.relative_path)
    }

    /// Route prefix: the base path, except for assets of the project being built.
    pub fn route_prefix(&self) -> &str {
        if self.source_type.is_current_project() || self.base_path == "/" {
            ""
        } else {
            &self.base_path
        }
    }

    /// Path relative to the output wwwroot, with preferences applied.
    pub fn target_path(&self) -> Result<String, PatternError> {
        let resolved = self.pattern()?.resolve(self, true)?;
        Ok(join_route(self.route_prefix(), &resolved.path))
    }

    /// Every route the asset is served under, each with the tokens it used.
    pub fn routes(&self) -> Result<Vec<ResolvedPath>, PatternError> {
        let prefix = self.route_prefix();
        self.pattern()?
            .expand()
            .iter()
            .map(|variant| {
                variant.resolve(self, false).map(|mut resolved| {
                    resolved.path = join_route(prefix, &resolved.path);
                    resolved
                })
            })
            .collect()
    }

    /// Label route: the relative path without token segments.
    pub fn label(&self) -> Result<String, PatternError> {
        Ok(join_route(self.route_prefix(), &self.pattern()?.label()))
    }

    /// File path below the content root.
    pub fn sub_path(&self) -> &str {
        let root = self.content_root.as_str();
        self.identity
            .strip_prefix(root)
            .unwrap_or(&self.identity)
            .trim_start_matches(['/', '\\'])
    }
}

impl TokenSource for StaticAsset {
    fn token(&self, name: &str) -> Option<&str> {
        match name {
            FINGERPRINT_TOKEN if !self.fingerprint.is_empty() => Some(&self.fingerprint),
            _ => None,
        }
    }
}

impl PartialOrd for StaticAsset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StaticAsset {
    /// Identity, then source type, then every other field.
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity
            .cmp(&other.identity)
            .then(self.source_type.cmp(&other.source_type))
            .then_with(|| self.source_id.cmp(&other.source_id))
            .then_with(|| self.content_root.cmp(&other.content_root))
            .then_with(|| self.base_path.cmp(&other.base_path))
            .then_with(|| self.relative_path.cmp(&other.relative_path))
            .then_with(|| self.asset_kind.cmp(&other.asset_kind))
            .then_with(|| self.asset_mode.cmp(&other.asset_mode))
            .then_with(|| self.asset_role.cmp(&other.asset_role))
            .then_with(|| self.related_asset.cmp(&other.related_asset))
            .then_with(|| self.asset_trait_name.cmp(&other.asset_trait_name))
            .then_with(|| self.asset_trait_value.cmp(&other.asset_trait_value))
            .then_with(|| self.fingerprint.cmp(&other.fingerprint))
            .then_with(|| self.integrity.cmp(&other.integrity))
            .then_with(|| {
                self.copy_to_output_directory
                    .cmp(&other.copy_to_output_directory)
            })
            .then_with(|| {
                self.copy_to_publish_directory
                    .cmp(&other.copy_to_publish_directory)
            })
            .then_with(|| self.file_length.cmp(&other.file_length))
            .then_with(|| self.last_write_time.cmp(&other.last_write_time))
    }
}
