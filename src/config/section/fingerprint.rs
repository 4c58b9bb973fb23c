//! `[fingerprint]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [fingerprint]
//! enable = true
//!
//! [[fingerprint.patterns]]
//! name = "modules"
//! pattern = "*.lib.module.js"
//! expression = "#[.{fingerprint}]!"
//! ```
//!
//! Files matching no pattern get `#[.{fingerprint}]?` before their last
//! extension, which keeps the plain name on disk and adds a fingerprinted
//! route.

use serde::{Deserialize, Serialize};

use crate::asset::pattern::{FINGERPRINT_TOKEN, PathPattern};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub enable: bool,
    pub patterns: Vec<FingerprintPattern>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            enable: true,
            patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintPattern {
    pub name: String,
    pub pattern: String,
    pub expression: String,
}

impl FingerprintConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        const FIELD: FieldPath = FieldPath::new("fingerprint.patterns");

        for rule in &self.patterns {
            if let Err(e) = globset::Glob::new(&rule.pattern) {
                diag.error(FIELD, format!("`{}`: invalid glob: {e}", rule.name));
            }
            match PathPattern::parse(&rule.expression) {
                Err(e) => diag.error_with_hint(
                    FIELD,
                    format!("`{}`: {e}", rule.name),
                    "expressions look like `#[.{fingerprint}]`, optionally followed by `!` or `?`",
                ),
                Ok(parsed)
                    if !parsed.label().is_empty() || !rule.expression.contains(FINGERPRINT_TOKEN) =>
                {
                    diag.error(
                        FIELD,
                        format!(
                            "`{}`: expression must consist of a single fingerprint token segment",
                            rule.name
                        ),
                    );
                }
                Ok(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_fingerprint_defaults() {
        let config = test_parse_config("");
        assert!(config.fingerprint.enable);
        assert!(config.fingerprint.patterns.is_empty());
    }

    #[test]
    fn test_fingerprint_patterns() {
        let config = test_parse_config(
            r##"
[[fingerprint.patterns]]
name = "js"
pattern = "*.js"
expression = "#[.{fingerprint}]!"
"##,
        );
        assert_eq!(config.fingerprint.patterns.len(), 1);
        let mut diag = ConfigDiagnostics::new();
        config.fingerprint.validate(&mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_fingerprint_malformed_expression() {
        let config = test_parse_config(
            r##"
[[fingerprint.patterns]]
name = "broken"
pattern = "*.js"
expression = "#[.{fingerprint}"
"##,
        );
        let mut diag = ConfigDiagnostics::new();
        config.fingerprint.validate(&mut diag);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_fingerprint_expression_with_literal_text() {
        let config = test_parse_config(
            r##"
[[fingerprint.patterns]]
name = "extra"
pattern = "*.js"
expression = "min#[.{fingerprint}]"
"##,
        );
        let mut diag = ConfigDiagnostics::new();
        config.fingerprint.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
