//! Explicit items: `[[assets]]` and `[[copy]]`.
//!
//! ```toml
//! # A user-declared static web asset. Wins over discovered files and
//! # replaces inherited assets with the same route.
//! [[assets]]
//! file = "generated/app.bundle.js"
//! relative_path = "js/app#[.{fingerprint}]!.js"
//! asset_kind = "Publish"
//!
//! # A plain file copied to the output wwwroot (not a static web asset).
//! [[copy]]
//! file = "robots.txt"
//! target = "robots.txt"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetKind, AssetMode, CopyOption, PathPattern};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetItemConfig {
    pub file: PathBuf,
    /// Defaults to the file path relative to the content root, or its file name.
    pub relative_path: Option<String>,
    pub base_path: Option<String>,
    pub asset_kind: Option<AssetKind>,
    pub asset_mode: Option<AssetMode>,
    pub copy_to_output: Option<CopyOption>,
    pub copy_to_publish: Option<CopyOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyItemConfig {
    pub file: PathBuf,
    /// Path below the output wwwroot.
    pub target: String,
}

impl AssetItemConfig {
    pub fn validate_all(items: &[Self], diag: &mut ConfigDiagnostics) {
        const FIELD: FieldPath = FieldPath::new("assets");

        for item in items {
            if item.file.as_os_str().is_empty() {
                diag.error(FIELD, "asset item without `file`");
            }
            if let Some(relative) = &item.relative_path
                && let Err(e) = PathPattern::parse(relative)
            {
                diag.error(FIELD, e.to_string());
            }
        }
    }
}

impl CopyItemConfig {
    pub fn validate_all(items: &[Self], diag: &mut ConfigDiagnostics) {
        for item in items {
            if item.target.trim_matches('/').is_empty() {
                diag.error(
                    FieldPath::new("copy"),
                    format!("`{}` has an empty target", item.file.display()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_asset_items_parse() {
        let config = test_parse_config(
            r##"
[[assets]]
file = "gen/app.js"
relative_path = "js/app#[.{fingerprint}]!.js"
asset_kind = "Publish"
copy_to_publish = "Always"
"##,
        );
        let item = &config.assets[0];
        assert_eq!(item.asset_kind, Some(AssetKind::Publish));
        assert_eq!(item.copy_to_publish, Some(CopyOption::Always));
        assert_eq!(item.asset_mode, None);

        let mut diag = ConfigDiagnostics::new();
        AssetItemConfig::validate_all(&config.assets, &mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_asset_item_malformed_pattern() {
        let config = test_parse_config(
            "[[assets]]\nfile = \"a.js\"\nrelative_path = \"a#[.{fingerprint}.js\"",
        );
        let mut diag = ConfigDiagnostics::new();
        AssetItemConfig::validate_all(&config.assets, &mut diag);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_copy_items() {
        let config = test_parse_config("[[copy]]\nfile = \"robots.txt\"\ntarget = \"/\"");
        let mut diag = ConfigDiagnostics::new();
        CopyItemConfig::validate_all(&config.copy, &mut diag);
        assert!(diag.has_errors());
    }
}
