//! Cross-project merge of referenced manifests.
//!
//! References are visited depth-first in declaration order. A referenced
//! manifest already carries everything that project inherited, so one level
//! of loading reaches the whole graph:
//!
//! - assets the referenced project owns become `Project` (or `Package`)
//!   assets here, unless their mode keeps them to that project
//! - assets it inherited keep their source type and count as transitive
//!
//! The first occurrence of an identity wins, which makes the nearest
//! reference win. Route-level precedence is left to conflict resolution.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::address::ResolveContext;
use crate::asset::{ManifestType, SourceType, StaticAsset};
use crate::config::{ProjectConfig, ReferenceConfig, ReferenceKind};
use crate::debug;

use super::{
    MANIFEST_VERSION, ManifestError, ReferencedProjectConfiguration, StaticWebAssetsManifest,
    manifest_file_name,
};

/// Assets and manifests inherited from the reference graph for one phase.
#[derive(Debug, Default)]
pub struct MergedReferences {
    pub assets: Vec<StaticAsset>,
    pub projects: Vec<ReferencedProjectConfiguration>,
    /// Manifest files read, for the up-to-date check.
    pub manifest_paths: Vec<PathBuf>,
}

impl MergedReferences {
    /// Resolution context for the project being built.
    pub fn resolve_context(&self, config: &ProjectConfig) -> ResolveContext {
        ResolveContext::new(config.project.name.as_str()).with_direct_references(
            config
                .references
                .iter()
                .filter(|r| r.kind == ReferenceKind::Project)
                .map(|r| r.name.as_str()),
        )
    }
}

/// Path of a reference's manifest for `phase`.
pub fn reference_manifest_path(
    config: &ProjectConfig,
    reference: &ReferenceConfig,
    phase: ManifestType,
) -> PathBuf {
    config
        .root_join(&reference.manifest_dir)
        .join(manifest_file_name(&reference.name, phase))
}

/// Load a referenced manifest. Missing or malformed manifests are errors
/// naming the project.
fn load_reference(
    reference: &ReferenceConfig,
    path: &Path,
) -> Result<StaticWebAssetsManifest, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::MissingReference {
            project: reference.name.clone(),
            path: path.to_path_buf(),
        });
    }
    let malformed = |reason: String| ManifestError::MalformedReference {
        project: reference.name.clone(),
        path: path.to_path_buf(),
        reason,
    };

    let manifest = match StaticWebAssetsManifest::load(path) {
        Ok(manifest) => manifest,
        Err(ManifestError::Json(e)) => return Err(malformed(e.to_string())),
        Err(e) => return Err(e),
    };
    if manifest.version != MANIFEST_VERSION {
        return Err(malformed(format!(
            "unsupported version {} (expected {MANIFEST_VERSION})",
            manifest.version
        )));
    }
    if manifest.source != reference.name {
        return Err(malformed(format!(
            "written for `{}`, not `{}`",
            manifest.source, reference.name
        )));
    }
    Ok(manifest)
}

/// Merge the manifests of every configured reference for `phase`.
pub fn merge_references(
    config: &ProjectConfig,
    phase: ManifestType,
) -> Result<MergedReferences, ManifestError> {
    let mut merged = MergedReferences::default();
    let mut visited: FxHashSet<String> = FxHashSet::default();
    let mut seen_projects: FxHashSet<String> = FxHashSet::default();

    for reference in &config.references {
        let path = reference_manifest_path(config, reference, phase);
        let manifest = load_reference(reference, &path)?;

        let source_type = match reference.kind {
            ReferenceKind::Project => SourceType::Project,
            ReferenceKind::Package => SourceType::Package,
        };
        let identity = path.to_string_lossy().into_owned();
        if seen_projects.insert(identity.clone()) {
            merged.projects.push(ReferencedProjectConfiguration {
                identity,
                source_id: reference.name.clone(),
                source_type,
            });
        }
        for transitive in &manifest.referenced_projects_configuration {
            if seen_projects.insert(transitive.identity.clone()) {
                merged.projects.push(transitive.clone());
            }
        }

        let before = merged.assets.len();
        for asset in manifest.assets {
            let Some(asset) = inherit(asset, source_type) else {
                continue;
            };
            if visited.insert(asset.identity.clone()) {
                merged.assets.push(asset);
            }
        }
        debug!("merge"; "{} contributed {} assets", reference.name, merged.assets.len() - before);
        merged.manifest_paths.push(path);
    }

    Ok(merged)
}

/// How an asset of a referenced manifest appears in the referencing one.
fn inherit(mut asset: StaticAsset, owner_type: SourceType) -> Option<StaticAsset> {
    if asset.source_type.is_current_project() {
        if !asset.asset_mode.visible_to_referencing_projects() {
            return None;
        }
        asset.source_type = owner_type;
    }
    Some(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetMode, make_asset};
    use crate::config::test_parse_config;
    use crate::manifest::ManifestBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, name: &str, assets: &[StaticAsset]) {
        let manifest = ManifestBuilder::new(name, ManifestType::Build)
            .build(assets)
            .unwrap();
        let path = dir.join(manifest_file_name(name, ManifestType::Build));
        manifest.write(&path).unwrap();
    }

    fn project(dir: &TempDir, refs: &str) -> ProjectConfig {
        let mut config = test_parse_config(refs);
        config.root = dir.path().to_path_buf();
        config
    }

    #[test]
    fn test_own_assets_become_project_assets() {
        let dir = TempDir::new().unwrap();
        let lib_dir = dir.path().join("lib");
        let mut hidden = make_asset("Lib", SourceType::Discovered, "internal.js");
        hidden.asset_mode = AssetMode::CurrentProject;
        write_manifest(
            &lib_dir,
            "Lib",
            &[make_asset("Lib", SourceType::Discovered, "lib.js"), hidden],
        );

        let config = project(&dir, "[[references]]\nname = \"Lib\"\nmanifest_dir = \"lib\"");
        let merged = merge_references(&config, ManifestType::Build).unwrap();

        assert_eq!(merged.assets.len(), 1);
        assert_eq!(merged.assets[0].source_type, SourceType::Project);
        assert_eq!(merged.assets[0].source_id, "Lib");
        assert_eq!(merged.projects.len(), 1);
        assert_eq!(merged.projects[0].source_type, SourceType::Project);
        assert_eq!(merged.manifest_paths.len(), 1);
    }

    #[test]
    fn test_package_reference() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            &dir.path().join("pkg"),
            "Vendor",
            &[make_asset("Vendor", SourceType::Discovered, "v.js")],
        );
        let config = project(
            &dir,
            "[[references]]\nname = \"Vendor\"\nmanifest_dir = \"pkg\"\nkind = \"package\"",
        );
        let merged = merge_references(&config, ManifestType::Build).unwrap();
        assert_eq!(merged.assets[0].source_type, SourceType::Package);
    }

    #[test]
    fn test_transitive_assets_keep_type_and_dedupe() {
        let dir = TempDir::new().unwrap();
        let deep = make_asset("Deep", SourceType::Project, "deep.js");
        write_manifest(
            &dir.path().join("a"),
            "A",
            &[make_asset("A", SourceType::Discovered, "a.js"), deep.clone()],
        );
        write_manifest(
            &dir.path().join("b"),
            "B",
            &[make_asset("B", SourceType::Discovered, "b.js"), deep.clone()],
        );

        let config = project(
            &dir,
            "[[references]]\nname = \"A\"\nmanifest_dir = \"a\"\n[[references]]\nname = \"B\"\nmanifest_dir = \"b\"",
        );
        let merged = merge_references(&config, ManifestType::Build).unwrap();
        let ids: Vec<_> = merged.assets.iter().map(|a| a.source_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "Deep", "B"]);
        let deep_merged = merged.assets.iter().find(|a| a.source_id == "Deep").unwrap();
        assert_eq!(deep_merged.source_type, SourceType::Project);

        let ctx = merged.resolve_context(&config);
        assert_eq!(
            ctx.precedence(deep_merged),
            crate::address::Precedence::TransitiveReference
        );
    }

    #[test]
    fn test_missing_manifest_names_project() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir, "[[references]]\nname = \"Gone\"\nmanifest_dir = \"gone\"");
        let err = merge_references(&config, ManifestType::Build).unwrap_err();
        assert!(matches!(err, ManifestError::MissingReference { .. }));
        assert!(err.to_string().contains("`Gone`"));
    }

    #[test]
    fn test_malformed_manifest_names_project() {
        let dir = TempDir::new().unwrap();
        let manifest_dir = dir.path().join("broken");
        fs::create_dir_all(&manifest_dir).unwrap();
        fs::write(
            manifest_dir.join(manifest_file_name("Broken", ManifestType::Build)),
            "{ not json",
        )
        .unwrap();

        let config = project(&dir, "[[references]]\nname = \"Broken\"\nmanifest_dir = \"broken\"");
        let err = merge_references(&config, ManifestType::Build).unwrap_err();
        assert!(matches!(err, ManifestError::MalformedReference { .. }));
        assert!(err.to_string().contains("`Broken`"));
    }

    #[test]
    fn test_manifest_of_wrong_project_is_malformed() {
        let dir = TempDir::new().unwrap();
        let lib_dir = dir.path().join("lib");
        write_manifest(&lib_dir, "Other", &[]);
        fs::rename(
            lib_dir.join(manifest_file_name("Other", ManifestType::Build)),
            lib_dir.join(manifest_file_name("Lib", ManifestType::Build)),
        )
        .unwrap();

        let config = project(&dir, "[[references]]\nname = \"Lib\"\nmanifest_dir = \"lib\"");
        let err = merge_references(&config, ManifestType::Build).unwrap_err();
        assert!(err.to_string().contains("written for `Other`"));
    }
}
