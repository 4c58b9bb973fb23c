//! `[project]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [project]
//! name = "MyApp"                       # SourceId and manifest file stem
//! base_path = "/"                      # route prefix seen by referencing projects
//! content_root = "wwwroot"             # discovery root
//! output = "obj/staticwebassets"       # manifests, compressed files, tracker state
//! output_wwwroot = "bin/wwwroot"       # folder plain content files are copied to
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSectionConfig {
    pub name: String,
    pub base_path: String,
    pub content_root: PathBuf,
    pub output: PathBuf,
    pub output_wwwroot: PathBuf,
}

impl Default for ProjectSectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_path: "/".to_string(),
            content_root: "wwwroot".into(),
            output: "obj/staticwebassets".into(),
            output_wwwroot: "bin/wwwroot".into(),
        }
    }
}

impl ProjectSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        const NAME: FieldPath = FieldPath::new("project.name");

        if self.name.trim().is_empty() {
            diag.error_with_hint(
                NAME,
                "project name is required",
                "the name is used as SourceId and as the manifest file name",
            );
        } else if self
            .name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        {
            diag.error(NAME, format!("`{}` is not a valid file name", self.name));
        }

        if self.base_path.contains('\\') {
            diag.warn(
                FieldPath::new("project.base_path"),
                "backslashes are normalized to `/`",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use std::path::PathBuf;

    #[test]
    fn test_project_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.project.base_path, "/");
        assert_eq!(config.project.content_root, PathBuf::from("wwwroot"));
        assert_eq!(config.project.output, PathBuf::from("obj/staticwebassets"));
    }

    #[test]
    fn test_project_name_required() {
        let mut config = test_parse_config("");
        config.project.name.clear();
        let mut diag = ConfigDiagnostics::new();
        config.project.validate(&mut diag);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_project_name_must_be_file_name() {
        let config = test_parse_config("[project]\nname = \"a/b\"");
        let mut diag = ConfigDiagnostics::new();
        config.project.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
