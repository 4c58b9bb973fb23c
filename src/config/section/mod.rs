//! Configuration sections of `swa.toml`.

mod compression;
mod discovery;
mod fingerprint;
mod items;
mod project;
mod reference;

pub use compression::{CompressionConfig, CompressionFormat};
pub use discovery::DiscoveryConfig;
pub use fingerprint::{FingerprintConfig, FingerprintPattern};
pub use items::{AssetItemConfig, CopyItemConfig};
pub use project::ProjectSectionConfig;
pub use reference::{ReferenceConfig, ReferenceKind};

use super::{ConfigDiagnostics, FieldPath};

/// Report every glob in `patterns` that fails to compile.
pub(super) fn validate_globs(patterns: &[String], field: FieldPath, diag: &mut ConfigDiagnostics) {
    for pattern in patterns {
        if let Err(e) = globset::Glob::new(pattern) {
            diag.error_with_hint(
                field,
                format!("invalid glob `{pattern}`: {e}"),
                "use `*` for one path segment and `**` for any depth",
            );
        }
    }
}
