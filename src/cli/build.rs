//! Manifest build orchestration.
//!
//! Build pipeline phases:
//! - **Check** - Compare the input set against the recorded tracker state
//! - **Discover** - Hash content root files and explicit `[[assets]]` items
//! - **Compress** - Write gzip / brotli variants of eligible primaries
//! - **Manifest** - Per phase: merge references, resolve, define endpoints
//! - **Write** - Build, publish and runtime manifests (only when changed)
//! - **Record** - Persist inputs and outputs for the next up-to-date check
//!
//! Both manifests are computed before anything is written, so a failing
//! phase never leaves a half-updated set of manifests behind.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::{
    address::{ConflictError, print_conflicts, print_physical_conflicts},
    asset::{self, ManifestType, StaticAsset},
    config::ProjectConfig,
    debug, debug_do,
    freshness::{Tracker, UpToDateCheck},
    log,
    manifest::{
        ManifestBuilder, ManifestError, RuntimeManifest, StaticWebAssetsManifest,
        merge_references, reference_manifest_path,
    },
    utils::plural_s,
};

/// Outcome of one `build` invocation.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Nothing changed since the last successful build.
    pub skipped: bool,
    /// Generated files whose bytes changed.
    pub written: Vec<PathBuf>,
    pub build: PhaseStats,
    pub publish: PhaseStats,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PhaseStats {
    pub assets: usize,
    pub endpoints: usize,
}

impl PhaseStats {
    fn of(manifest: &StaticWebAssetsManifest) -> Self {
        Self {
            assets: manifest.assets.len(),
            endpoints: manifest.endpoints.len(),
        }
    }
}

/// Run the pipeline for both phases unless every input is up to date.
pub fn build_project(config: &ProjectConfig, force: bool) -> Result<BuildReport> {
    let tracker = Tracker::load(&config.state_path(), &config.removed_marker_path());
    let inputs = collect_inputs(config, &tracker)?;
    let changes = tracker.check(&inputs);

    if !force && tracker.is_up_to_date(&changes) {
        log!("build"; "up to date");
        return Ok(BuildReport {
            skipped: true,
            ..Default::default()
        });
    }
    debug!("build"; "{} added, {} removed, {} modified",
        changes.added.len(), changes.removed.len(), changes.modified.len());
    debug_do! {
        let listed = [("+", &changes.added), ("-", &changes.removed), ("~", &changes.modified)];
        for (mark, paths) in listed {
            for path in paths.iter().take(20) {
                debug!("input"; "{mark} {}", path.display());
            }
        }
    }

    // Discover + compress
    let discovered = asset::discover(config)?;
    let compressed = asset::compress_assets(config, &discovered.assets)?;
    let mut local: Vec<StaticAsset> = discovered.assets;
    local.extend(compressed.assets.iter().cloned());

    // Compute every manifest before writing any of them
    let build = build_manifest(config, ManifestType::Build, &local)?;
    let publish = build_manifest(config, ManifestType::Publish, &local)?;
    let runtime = RuntimeManifest::from_manifest(&build)
        .context("failed to compute runtime manifest")?;

    let mut report = BuildReport {
        build: PhaseStats::of(&build),
        publish: PhaseStats::of(&publish),
        ..Default::default()
    };

    let mut outputs = Vec::new();
    for (phase, manifest) in [(ManifestType::Build, &build), (ManifestType::Publish, &publish)] {
        let path = config.manifest_path(phase);
        if manifest.write(&path)? {
            report.written.push(path.clone());
        }
        outputs.push(path);
    }
    let runtime_path = config.runtime_manifest_path();
    if runtime.write(&runtime_path)? {
        report.written.push(runtime_path.clone());
    }
    outputs.push(runtime_path);
    outputs.extend(compressed.files());
    outputs.sort();

    // Record against the inputs read by this build
    let check = UpToDateCheck {
        inputs: tracker.input_set(&inputs, &changes)?,
        outputs,
    };
    tracker.record(&check)?;

    log!("build"; "{} asset{}, {} endpoint{}",
        report.build.assets, plural_s(report.build.assets),
        report.build.endpoints, plural_s(report.build.endpoints));
    log!("publish"; "{} asset{}, {} endpoint{}",
        report.publish.assets, plural_s(report.publish.assets),
        report.publish.endpoints, plural_s(report.publish.endpoints));
    debug!("build"; "{} file{} written, {} compressed rewritten",
        report.written.len(), plural_s(report.written.len()), compressed.written);

    Ok(report)
}

/// Every file the pipeline reads: assets, the config file and the manifests
/// of every reference in both phases.
fn collect_inputs(config: &ProjectConfig, tracker: &Tracker) -> Result<Vec<PathBuf>> {
    let mut inputs = asset::input_files(config)?;
    if !config.config_path.as_os_str().is_empty() {
        inputs.push(config.config_path.clone());
    }
    for reference in &config.references {
        for phase in ManifestType::ALL {
            inputs.push(reference_manifest_path(config, reference, phase));
        }
    }
    inputs.push(tracker.marker_path().to_path_buf());
    inputs.sort();
    inputs.dedup();
    Ok(inputs)
}

/// Merge references and build the manifest of one phase.
fn build_manifest(
    config: &ProjectConfig,
    phase: ManifestType,
    local: &[StaticAsset],
) -> Result<StaticWebAssetsManifest> {
    let merged = merge_references(config, phase)?;

    let mut candidates = local.to_vec();
    candidates.extend(merged.assets.iter().cloned());

    let output_files = config
        .copy
        .iter()
        .map(|item| {
            let file = config.root_join(&item.file);
            (item.target.clone(), file.to_string_lossy().into_owned())
        })
        .collect();

    ManifestBuilder::new(&config.project.name, phase)
        .resolve_context(merged.resolve_context(config))
        .discovery_patterns(asset::discovery_patterns(config))
        .references(merged.projects.clone())
        .output_files(output_files)
        .build(&candidates)
        .map_err(|err| report_failure(phase, err))
}

/// Print conflict listings in the log format and shorten the error.
fn report_failure(phase: ManifestType, err: ManifestError) -> anyhow::Error {
    match err {
        ManifestError::Conflict(ConflictError::Routes(conflicts)) => {
            print_conflicts(&conflicts);
            anyhow!("{phase} manifest has {} conflicting route{}",
                conflicts.len(), plural_s(conflicts.len()))
        }
        ManifestError::Conflict(ConflictError::Physical(conflicts)) => {
            print_physical_conflicts(&conflicts);
            anyhow!("{phase} manifest has {} asset{} shadowed by output files",
                conflicts.len(), plural_s(conflicts.len()))
        }
        err => anyhow::Error::new(err).context(format!("failed to build {phase} manifest")),
    }
}

// ============================================================================
// tests
// ============================================================================
