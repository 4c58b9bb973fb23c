//! Closed metadata enums of a static web asset.
//!
//! Every enum serializes as its PascalCase name, matching the manifest
//! format (`"SourceType": "Discovered"`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Found by globbing the project's content root.
    Discovered,
    /// Produced by the build (explicit items, compressed variants).
    Computed,
    /// Inherited from a referenced project.
    Project,
    /// Inherited from a package dependency.
    Package,
}

impl SourceType {
    /// Assets owned by the project being built.
    pub const fn is_current_project(self) -> bool {
        matches!(self, Self::Discovered | Self::Computed)
    }
}

/// Which build phase includes an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Build,
    Publish,
    All,
}

impl AssetKind {
    /// Kind implied by the copy options when none is given explicitly.
    pub const fn from_copy_options(copy_to_publish: CopyOption) -> Self {
        match copy_to_publish {
            CopyOption::Never => Self::Build,
            _ => Self::All,
        }
    }

    /// Whether this kind is included in the given manifest phase.
    pub const fn includes(self, phase: ManifestType) -> bool {
        matches!(
            (self, phase),
            (Self::All, _) | (Self::Build, ManifestType::Build) | (Self::Publish, ManifestType::Publish)
        )
    }
}

/// Which projects see an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetMode {
    /// Only projects referencing the owner.
    Reference,
    /// Only the owning project.
    CurrentProject,
    All,
}

impl AssetMode {
    pub const fn visible_to_current_project(self) -> bool {
        !matches!(self, Self::Reference)
    }

    pub const fn visible_to_referencing_projects(self) -> bool {
        !matches!(self, Self::CurrentProject)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetRole {
    Primary,
    Related,
    /// Same content in another representation (e.g. precompressed).
    Alternative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CopyOption {
    Never,
    PreserveNewest,
    Always,
}

/// The two manifest flavors written per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManifestType {
    Build,
    Publish,
}

impl ManifestType {
    pub const ALL: [Self; 2] = [Self::Build, Self::Publish];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
