//! `[[references]]` configuration: the ordered project-reference list.
//!
//! # Example
//!
//! ```toml
//! [[references]]
//! name = "RazorLib"
//! manifest_dir = "../RazorLib/obj/staticwebassets"
//!
//! [[references]]
//! name = "Vendor.Package"
//! manifest_dir = "../packages/vendor/staticwebassets"
//! kind = "package"
//! ```

use std::path::PathBuf;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    #[default]
    Project,
    Package,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    pub name: String,
    pub manifest_dir: PathBuf,
    #[serde(default)]
    pub kind: ReferenceKind,
}

impl ReferenceConfig {
    pub fn validate_all(references: &[Self], project_name: &str, diag: &mut ConfigDiagnostics) {
        const FIELD: FieldPath = FieldPath::new("references");

        let mut seen = FxHashSet::default();
        for reference in references {
            if reference.name.trim().is_empty() {
                diag.error(FIELD, "reference name is required");
                continue;
            }
            if reference.name == project_name {
                diag.error(FIELD, format!("`{}` references itself", reference.name));
            }
            if !seen.insert(reference.name.as_str()) {
                diag.error_with_hint(
                    FIELD,
                    format!("`{}` is referenced twice", reference.name),
                    "list each referenced project once",
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
    fn test_references_parse() {
        let config = test_parse_config(
            r#"
[[references]]
name = "Lib"
manifest_dir = "../Lib/obj"

[[references]]
name = "Pkg"
manifest_dir = "../pkg"
kind = "package"
"#,
        );
        assert_eq!(config.references.len(), 2);
        assert_eq!(config.references[0].kind, ReferenceKind::Project);
        assert_eq!(config.references[1].kind, ReferenceKind::Package);
    }

    #[test]
    fn test_references_duplicates_and_self() {
        let config = test_parse_config(
            r#"
[[references]]
name = "Lib"
manifest_dir = "a"

[[references]]
name = "Lib"
manifest_dir = "b"

[[references]]
name = "App"
manifest_dir = "c"
"#,
        );
        let mut diag = ConfigDiagnostics::new();
        ReferenceConfig::validate_all(&config.references, "App", &mut diag);
        assert_eq!(diag.errors().len(), 2);
    }
}
