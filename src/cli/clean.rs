//! Removal of generated artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::asset::ManifestType;
use crate::config::ProjectConfig;
use crate::utils::plural_s;
use crate::{debug, log};

/// Delete manifests, runtime manifest, compressed files and tracker state.
///
/// Returns the paths that existed and were removed.
pub fn clean_project(config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    let mut targets: Vec<PathBuf> = ManifestType::ALL
        .iter()
        .map(|&phase| config.manifest_path(phase))
        .collect();
    targets.push(config.runtime_manifest_path());
    targets.push(config.state_path());
    targets.push(config.removed_marker_path());
    targets.push(config.compressed_dir());

    let mut removed = Vec::new();
    for target in targets {
        if remove(&target).with_context(|| format!("failed to remove {}", target.display()))? {
            debug!("clean"; "removed {}", target.display());
            removed.push(target);
        }
    }

    log!("clean"; "removed {} item{}", removed.len(), plural_s(removed.len()));
    Ok(removed)
}

/// Remove a file or directory tree. A missing path is not an error.
fn remove(path: &Path) -> io::Result<bool> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build::build_project;
    use tempfile::TempDir;

    #[test]
    fn test_clean_after_build() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("wwwroot")).unwrap();
        fs::write(root.join("wwwroot/app.js"), "console.log(1);").unwrap();
        fs::write(root.join("swa.toml"), "[project]\nname = \"App\"\n").unwrap();
        let config = ProjectConfig::load_from(&root.join("swa.toml")).unwrap();

        build_project(&config, false).unwrap();
        let removed = clean_project(&config).unwrap();
        assert!(removed.contains(&config.compressed_dir()));
        assert!(!config.manifest_path(ManifestType::Build).exists());
        assert!(!config.state_path().exists());

        // Sources are untouched, second clean is a no-op
        assert!(root.join("wwwroot/app.js").is_file());
        assert!(clean_project(&config).unwrap().is_empty());
    }
}
