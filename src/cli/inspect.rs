//! Human-readable summary of a written manifest.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::asset::{AssetRole, ManifestType, SourceType};
use crate::config::ProjectConfig;
use crate::endpoint::StaticAssetEndpoint;
use crate::manifest::StaticWebAssetsManifest;
use crate::utils::plural_s;

/// Load the manifest of `phase` and print its summary to stdout.
pub fn inspect_manifest(config: &ProjectConfig, phase: ManifestType, endpoints: bool) -> Result<()> {
    let path = config.manifest_path(phase);
    let manifest = StaticWebAssetsManifest::load(&path)
        .with_context(|| format!("no {phase} manifest, run `swa build` first"))?;
    println!(
        "{} {} manifest (version {}, hash {})",
        manifest.source.bold(),
        manifest.manifest_type,
        manifest.version,
        short_hash(&manifest.hash).dimmed()
    );
    print!("{}", summarize(&manifest, endpoints));
    Ok(())
}

/// Render the summary body. Endpoint listing is grouped by route.
pub fn summarize(manifest: &StaticWebAssetsManifest, endpoints: bool) -> String {
    let mut out = String::new();
    let mut by_source: BTreeMap<SourceType, usize> = BTreeMap::new();
    let mut by_role: BTreeMap<AssetRole, usize> = BTreeMap::new();
    for asset in &manifest.assets {
        *by_source.entry(asset.source_type).or_default() += 1;
        *by_role.entry(asset.asset_role).or_default() += 1;
    }

    let count = manifest.assets.len();
    let _ = writeln!(out, "  assets: {count}");
    for (source, n) in &by_source {
        let _ = writeln!(out, "    {source:?}: {n}");
    }
    for (role, n) in &by_role {
        let _ = writeln!(out, "    {role:?}: {n}");
    }

    let routes = group_by_route(&manifest.endpoints);
    let _ = writeln!(
        out,
        "  endpoints: {} ({} route{})",
        manifest.endpoints.len(),
        routes.len(),
        plural_s(routes.len())
    );
    let _ = writeln!(
        out,
        "  references: {}",
        manifest.referenced_projects_configuration.len()
    );

    if endpoints {
        for (route, group) in &routes {
            let _ = writeln!(out, "{route}");
            for endpoint in group {
                let _ = writeln!(out, "  {}", describe(endpoint));
            }
        }
    }
    out
}

fn group_by_route(endpoints: &[StaticAssetEndpoint]) -> BTreeMap<&str, Vec<&StaticAssetEndpoint>> {
    let mut routes: BTreeMap<&str, Vec<&StaticAssetEndpoint>> = BTreeMap::new();
    for endpoint in endpoints {
        routes.entry(endpoint.route.as_str()).or_default().push(endpoint);
    }
    routes
}

fn describe(endpoint: &StaticAssetEndpoint) -> String {
    let selectors: Vec<String> = endpoint
        .selectors
        .iter()
        .map(|s| format!("{}={} q={}", s.name, s.value, s.quality))
        .collect();
    if selectors.is_empty() {
        endpoint.asset_file.clone()
    } else {
        format!("{} [{}]", endpoint.asset_file, selectors.join(", "))
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}
