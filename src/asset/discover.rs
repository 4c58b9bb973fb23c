//! Asset discovery: content-root globbing, explicit items, parallel hashing.
//!
//! Discovery turns the configured inputs into fully populated
//! [`StaticAsset`] records:
//!
//! 1. Walk the content root (jwalk, sorted) and keep files matching the
//!    include globs but none of the exclude globs.
//! 2. Add explicit `[[assets]]` items.
//! 3. Insert the fingerprint expression into each relative path.
//! 4. Hash every file in parallel. Files that vanished since the walk are
//!    reported and dropped.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;
use rayon::prelude::*;

use super::integrity::{FileDigest, digest_bytes, digest_file};
use super::kind::{AssetKind, AssetMode, CopyOption, SourceType};
use super::model::StaticAsset;
use super::pattern::{DEFAULT_EXPRESSION, insert_expression};
use crate::config::{AssetItemConfig, ProjectConfig};
use crate::logger::ProgressLine;
use crate::manifest::DiscoveryPattern;
use crate::utils::date::http_date;
use crate::utils::path::{content_root_string, normalize_route, relative_slash};
use crate::{debug, log};

/// Compile a list of globs into one matcher.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

/// Result of a discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveredAssets {
    /// Hashed assets, sorted by identity.
    pub assets: Vec<StaticAsset>,
    /// Files that disappeared between the walk and hashing.
    pub vanished: Vec<PathBuf>,
}

impl DiscoveredAssets {
    /// Source files backing the discovered assets.
    pub fn input_files(&self) -> Vec<PathBuf> {
        self.assets
            .iter()
            .map(|asset| PathBuf::from(&asset.identity))
            .collect()
    }
}

/// One file to hash, with the metadata decided before hashing.
#[derive(Debug)]
struct Candidate<'a> {
    path: PathBuf,
    content_root: PathBuf,
    relative_path: String,
    item: Option<&'a AssetItemConfig>,
}

// ============================================================================
// Fingerprint rules
// ============================================================================

/// Chooses the fingerprint expression inserted into a relative path.
pub struct FingerprintRules {
    enabled: bool,
    rules: Vec<(globset::GlobMatcher, String, String)>,
}

impl FingerprintRules {
    pub fn new(config: &ProjectConfig) -> Result<Self> {
        let mut rules = Vec::with_capacity(config.fingerprint.patterns.len());
        for rule in &config.fingerprint.patterns {
            let matcher = Glob::new(&rule.pattern)
                .with_context(|| format!("fingerprint pattern `{}`", rule.name))?
                .compile_matcher();
            let suffix = rule
                .pattern
                .rfind('*')
                .map_or(rule.pattern.as_str(), |i| &rule.pattern[i + 1..])
                .to_string();
            rules.push((matcher, suffix, rule.expression.clone()));
        }
        Ok(Self {
            enabled: config.fingerprint.enable,
            rules,
        })
    }

    /// Relative path with the matching expression inserted.
    pub fn apply(&self, relative_path: &str) -> String {
        if !self.enabled {
            return relative_path.to_string();
        }
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        match self
            .rules
            .iter()
            .find(|(matcher, _, _)| matcher.is_match(file_name))
        {
            Some((_, suffix, expression)) => insert_expression(relative_path, suffix, expression),
            None => insert_expression(relative_path, "", DEFAULT_EXPRESSION),
        }
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Discover, fingerprint and hash every asset of the current project.
pub fn discover(config: &ProjectConfig) -> Result<DiscoveredAssets> {
    let rules = FingerprintRules::new(config)?;
    let mut candidates = scan_content_root(config, &rules)?;
    candidates.extend(explicit_candidates(config, &rules));

    let progress = ProgressLine::new(&[("hash", candidates.len())]);
    let results: Vec<_> = candidates
        .par_iter()
        .map(|candidate| {
            let result = hash_candidate(candidate);
            progress.inc("hash");
            (candidate, result)
        })
        .collect();
    progress.finish();

    let mut discovered = DiscoveredAssets::default();
    for (candidate, result) in results {
        match result {
            Some(file) => discovered.assets.push(build_asset(config, candidate, file)),
            None => discovered.vanished.push(candidate.path.clone()),
        }
    }

    // An explicit item wins over the discovered record of the same file.
    discovered.assets.sort();
    discovered.assets.dedup_by(|later, earlier| {
        if later.identity == earlier.identity {
            if later.source_type == SourceType::Computed {
                std::mem::swap(later, earlier);
            }
            true
        } else {
            false
        }
    });

    debug!("discover"; "{} assets, {} vanished", discovered.assets.len(), discovered.vanished.len());
    Ok(discovered)
}

/// Files a discovery pass would read, without hashing them.
///
/// This is the asset part of the up-to-date check input set.
pub fn input_files(config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    let rules = FingerprintRules::new(config)?;
    let mut paths: Vec<PathBuf> = scan_content_root(config, &rules)?
        .into_iter()
        .map(|candidate| candidate.path)
        .collect();
    paths.extend(
        config
            .assets
            .iter()
            .map(|item| config.root_join(&item.file))
            .filter(|path| path.is_file()),
    );
    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn scan_content_root<'a>(
    config: &'a ProjectConfig,
    rules: &FingerprintRules,
) -> Result<Vec<Candidate<'a>>> {
    let root = config.content_root();
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let include = build_glob_set(&config.discovery.include).context("discovery.include")?;
    let exclude = build_glob_set(&config.discovery.exclude).context("discovery.exclude")?;
    let output_dir = config.output_dir();

    let candidates = WalkDir::new(&root)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .filter(|path| !path.starts_with(&output_dir))
        .filter_map(|path| {
            let relative = relative_slash(&path, &root)?;
            (include.is_match(&relative) && !exclude.is_match(&relative)).then(|| Candidate {
                relative_path: rules.apply(&relative),
                content_root: root.clone(),
                path,
                item: None,
            })
        })
        .collect();
    Ok(candidates)
}

fn explicit_candidates<'a>(
    config: &'a ProjectConfig,
    rules: &FingerprintRules,
) -> Vec<Candidate<'a>> {
    let content_root = config.content_root();
    config
        .assets
        .iter()
        .map(|item| {
            let path = config.root_join(&item.file);
            let (root, relative) = match relative_slash(&path, &content_root) {
                Some(relative) => (content_root.clone(), relative),
                None => {
                    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    (parent, name)
                }
            };
            let relative_path = match &item.relative_path {
                Some(explicit) => normalize_route(explicit),
                None => rules.apply(&relative),
            };
            Candidate {
                path,
                content_root: root,
                relative_path,
                item: Some(item),
            }
        })
        .collect()
}

/// Hash one candidate. `None` means the file vanished.
fn hash_candidate(candidate: &Candidate<'_>) -> Option<FileDigest> {
    match digest_file(&candidate.path) {
        Ok(file) => Some(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log!("warning"; "{} vanished before hashing, treating it as removed", candidate.path.display());
            None
        }
        Err(e) => Some(fallback_digest(&candidate.path, &e)),
    }
}

/// Deterministic stand-in for an unreadable file: the digest of its path.
fn fallback_digest(path: &Path, error: &io::Error) -> FileDigest {
    log!("warning"; "cannot read {}: {}, using a path-derived fingerprint", path.display(), error);
    FileDigest {
        digest: digest_bytes(path.to_string_lossy().as_bytes()),
        length: 0,
        last_write_time: http_date(std::time::SystemTime::UNIX_EPOCH),
    }
}

fn build_asset(config: &ProjectConfig, candidate: &Candidate<'_>, file: FileDigest) -> StaticAsset {
    let source_type = match candidate.item {
        Some(_) => SourceType::Computed,
        None => SourceType::Discovered,
    };
    let base_path = candidate
        .item
        .and_then(|item| item.base_path.as_deref())
        .unwrap_or(&config.project.base_path);

    let mut asset = StaticAsset::new(
        candidate.path.to_string_lossy(),
        config.project.name.clone(),
        source_type,
        &candidate.content_root,
        base_path,
        &candidate.relative_path,
    );

    match candidate.item {
        Some(item) => {
            asset.copy_to_output_directory = item.copy_to_output.unwrap_or(CopyOption::Never);
            asset.copy_to_publish_directory =
                item.copy_to_publish.unwrap_or(CopyOption::PreserveNewest);
            asset.asset_kind = item
                .asset_kind
                .unwrap_or_else(|| AssetKind::from_copy_options(asset.copy_to_publish_directory));
            asset.asset_mode = item.asset_mode.unwrap_or(AssetMode::All);
        }
        None => {
            asset.asset_mode = config.discovery.mode;
            if let Some(kind) = config.discovery.kind {
                asset.asset_kind = kind;
            }
        }
    }

    asset.fingerprint = file.digest.fingerprint;
    asset.integrity = file.digest.integrity;
    asset.file_length = file.length;
    asset.last_write_time = file.last_write_time;
    asset
}

/// Discovery patterns recorded in the manifest for design-time tooling.
pub fn discovery_patterns(config: &ProjectConfig) -> Vec<DiscoveryPattern> {
    if config.discovery.include.is_empty() {
        return Vec::new();
    }
    vec![DiscoveryPattern {
        name: format!("{}\\wwwroot", config.project.name),
        source: config.project.name.clone(),
        content_root: content_root_string(&config.content_root()),
        base_path: crate::utils::path::base_path_or_root(&config.project.base_path),
        pattern: config.discovery.include.join(";"),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::fs;
    use tempfile::TempDir;

    fn project(dir: &TempDir, extra: &str) -> ProjectConfig {
        let mut config = test_parse_config(extra);
        config.root = dir.path().to_path_buf();
        config
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_fingerprint_rules() {
        let dir = TempDir::new().unwrap();
        let config = project(
            &dir,
            r##"
[[fingerprint.patterns]]
name = "modules"
pattern = "*.lib.module.js"
expression = "#[.{fingerprint}]!"
"##,
        );
        let rules = FingerprintRules::new(&config).unwrap();
        assert_eq!(rules.apply("app.js"), "app#[.{fingerprint}]?.js");
        assert_eq!(
            rules.apply("js/app.lib.module.js"),
            "js/app#[.{fingerprint}]!.lib.module.js"
        );
    }

    #[test]
    fn test_fingerprint_rules_disabled() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir, "[fingerprint]\nenable = false");
        let rules = FingerprintRules::new(&config).unwrap();
        assert_eq!(rules.apply("app.js"), "app.js");
    }

    #[test]
    fn test_discover_content_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "wwwroot/app.js", "console.log(1)");
        write(&dir, "wwwroot/css/site.css", "body {}");
        write(&dir, "wwwroot/css/site.scss", "$x: 1;");
        let config = project(&dir, "[discovery]\nexclude = [\"**/*.scss\"]");

        let discovered = discover(&config).unwrap();
        let relative: Vec<_> = discovered
            .assets
            .iter()
            .map(|a| a.relative_path.as_str())
            .collect();
        assert_eq!(
            relative,
            vec!["app#[.{fingerprint}]?.js", "css/site#[.{fingerprint}]?.css"]
        );

        let app = &discovered.assets[0];
        assert_eq!(app.source_id, "App");
        assert_eq!(app.source_type, SourceType::Discovered);
        assert_eq!(app.file_length, 14);
        assert_eq!(app.fingerprint.len(), 10);
        app.validate().unwrap();
        assert_eq!(app.target_path().unwrap(), "app.js");
    }

    #[test]
    fn test_discover_missing_content_root() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir, "");
        assert!(discover(&config).unwrap().assets.is_empty());
    }

    #[test]
    fn test_explicit_item_wins_over_discovery() {
        let dir = TempDir::new().unwrap();
        write(&dir, "wwwroot/app.js", "console.log(1)");
        let config = project(
            &dir,
            r##"
[[assets]]
file = "wwwroot/app.js"
relative_path = "js/app#[.{fingerprint}]!.js"
asset_kind = "Publish"
"##,
        );

        let discovered = discover(&config).unwrap();
        assert_eq!(discovered.assets.len(), 1);
        let asset = &discovered.assets[0];
        assert_eq!(asset.source_type, SourceType::Computed);
        assert_eq!(asset.asset_kind, AssetKind::Publish);
        assert_eq!(asset.relative_path, "js/app#[.{fingerprint}]!.js");
    }

    #[test]
    fn test_explicit_item_outside_content_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "generated/bundle.js", "x");
        let config = project(
            &dir,
            "[[assets]]\nfile = \"generated/bundle.js\"\ncopy_to_publish = \"Never\"",
        );

        let discovered = discover(&config).unwrap();
        let asset = &discovered.assets[0];
        assert_eq!(asset.relative_path, "bundle#[.{fingerprint}]?.js");
        assert_eq!(asset.asset_kind, AssetKind::Build);
        assert!(asset.content_root.contains("generated"));
    }

    #[test]
    fn test_vanished_explicit_item() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir, "[[assets]]\nfile = \"gone.js\"");

        let discovered = discover(&config).unwrap();
        assert!(discovered.assets.is_empty());
        assert_eq!(discovered.vanished.len(), 1);
    }

    #[test]
    fn test_discovery_is_order_independent() {
        let dir = TempDir::new().unwrap();
        for name in ["c.js", "a.js", "b/z.css", "b/a.css"] {
            write(&dir, &format!("wwwroot/{name}"), name);
        }
        let config = project(&dir, "");
        let first = discover(&config).unwrap().assets;
        let second = discover(&config).unwrap().assets;
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_input_files_skip_missing_items() {
        let dir = TempDir::new().unwrap();
        write(&dir, "wwwroot/app.js", "x");
        write(&dir, "extra.js", "y");
        let config = project(
            &dir,
            "[[assets]]\nfile = \"wwwroot/app.js\"\n[[assets]]\nfile = \"extra.js\"\n[[assets]]\nfile = \"gone.js\"",
        );
        let files = input_files(&config).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.is_file()));
    }

    #[test]
    fn test_discovery_patterns() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir, "[discovery]\ninclude = [\"**/*.js\", \"**/*.css\"]");
        let patterns = discovery_patterns(&config);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, "**/*.js;**/*.css");
        assert_eq!(patterns[0].base_path, "/");
    }
}
