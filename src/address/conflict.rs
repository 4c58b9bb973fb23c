//! Route conflict resolution between candidate assets.
//!
//! Candidates of one phase are grouped by target path. A group with more
//! than one asset is settled by precedence tier:
//!
//! | Tier                  | Assets                                    |
//! |-----------------------|-------------------------------------------|
//! | `Explicit`            | `Computed` items of the current project   |
//! | `Discovered`          | files found under the content root        |
//! | `DirectReference`     | projects referenced directly              |
//! | `TransitiveReference` | projects reached through another project  |
//! | `Package`             | package dependencies                      |
//!
//! A unique top tier wins. Anything else is a conflict, and every conflict
//! of the phase is reported together.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::asset::{AssetKind, PatternError, SourceType, StaticAsset};
use crate::utils::path::normalize_route;
use crate::utils::plural_s;
use crate::{debug, log};

/// Precedence tier, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Explicit,
    Discovered,
    DirectReference,
    TransitiveReference,
    Package,
}

/// What the resolver needs to know about the project being built.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// SourceId of the current project.
    pub source_id: String,
    /// SourceIds of directly referenced projects.
    pub direct_references: FxHashSet<String>,
}

impl ResolveContext {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            direct_references: FxHashSet::default(),
        }
    }

    pub fn with_direct_references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direct_references
            .extend(references.into_iter().map(Into::into));
        self
    }

    pub fn precedence(&self, asset: &StaticAsset) -> Precedence {
        match asset.source_type {
            SourceType::Computed => Precedence::Explicit,
            SourceType::Discovered => Precedence::Discovered,
            SourceType::Project if self.direct_references.contains(&asset.source_id) => {
                Precedence::DirectReference
            }
            SourceType::Project => Precedence::TransitiveReference,
            SourceType::Package => Precedence::Package,
        }
    }
}

/// Several assets claim one route and none of them outranks the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub route: String,
    /// Identities of every tied asset, sorted.
    pub identities: Vec<String>,
}

/// A static web asset and a plain copied file claim one output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalConflict {
    pub route: String,
    pub identity: String,
    pub file: String,
}

#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("conflicting static web assets:\n{}", format_conflicts(.0))]
    Routes(Vec<RouteConflict>),

    #[error("static web assets conflict with files in the output folder:\n{}", format_physical(.0))]
    Physical(Vec<PhysicalConflict>),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

// ============================================================================
// Resolution
// ============================================================================

/// Pick one winner per target path. Losers are dropped together with the
/// alternatives and related assets hanging off them.
///
/// Primaries are settled first. Dependents of a losing primary never
/// compete for their own routes, so two same-route primaries with
/// same-route variants resolve exactly like the primaries alone.
///
/// `assets` must already be filtered to one phase and unique by identity.
pub fn resolve_conflicts(
    assets: Vec<StaticAsset>,
    ctx: &ResolveContext,
) -> Result<Vec<StaticAsset>, ConflictError> {
    let routes = assets
        .iter()
        .map(StaticAsset::target_path)
        .collect::<Result<Vec<_>, _>>()?;

    let mut dropped: FxHashSet<usize> = FxHashSet::default();
    let mut conflicts = Vec::new();

    let primaries: Vec<usize> = (0..assets.len()).filter(|&i| assets[i].is_primary()).collect();
    settle(&assets, &routes, &primaries, ctx, &mut dropped, &mut conflicts);

    // Surviving dependents, plus the primaries they may collide with
    let orphans = orphaned_dependents(&assets, &identities_of(&assets, &dropped));
    let contested: FxHashSet<&str> = conflicts.iter().map(|c| c.route.as_str()).collect();
    let rest: Vec<usize> = (0..assets.len())
        .filter(|i| !dropped.contains(i) && !orphans.contains(i))
        .filter(|&i| !contested.contains(routes[i].as_str()))
        .collect();
    let mut late = Vec::new();
    settle(&assets, &routes, &rest, ctx, &mut dropped, &mut late);
    conflicts.extend(late);

    if !conflicts.is_empty() {
        conflicts.sort_by(|a, b| a.route.cmp(&b.route));
        return Err(ConflictError::Routes(conflicts));
    }

    let orphans = orphaned_dependents(&assets, &identities_of(&assets, &dropped));
    Ok(assets
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i) && !orphans.contains(i))
        .map(|(_, asset)| asset)
        .collect())
}

/// Group `members` by route and settle every shared route by precedence.
fn settle(
    assets: &[StaticAsset],
    routes: &[String],
    members: &[usize],
    ctx: &ResolveContext,
    dropped: &mut FxHashSet<usize>,
    conflicts: &mut Vec<RouteConflict>,
) {
    let mut by_route: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &index in members {
        by_route.entry(routes[index].as_str()).or_default().push(index);
    }

    for (route, group) in by_route {
        if group.len() < 2 {
            continue;
        }
        let mut candidates = group;
        drop_unspecific_kinds(assets, &mut candidates, dropped);

        let Some(best) = candidates.iter().map(|&i| ctx.precedence(&assets[i])).min() else {
            continue;
        };
        let winners: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| ctx.precedence(&assets[i]) == best)
            .collect();

        if let [winner] = winners.as_slice() {
            for &loser in candidates.iter().filter(|&&i| i != *winner) {
                debug!("resolve"; "{} overrides {} at {}", assets[*winner].identity, assets[loser].identity, route);
                dropped.insert(loser);
            }
        } else {
            let mut identities: Vec<String> =
                winners.iter().map(|&i| assets[i].identity.clone()).collect();
            identities.sort();
            conflicts.push(RouteConflict {
                route: route.to_string(),
                identities,
            });
        }
    }
}

fn identities_of<'a>(assets: &'a [StaticAsset], indices: &FxHashSet<usize>) -> FxHashSet<&'a str> {
    indices.iter().map(|&i| assets[i].identity.as_str()).collect()
}

/// Within one SourceId a phase-specific kind replaces an `All` asset.
fn drop_unspecific_kinds(
    assets: &[StaticAsset],
    candidates: &mut Vec<usize>,
    dropped: &mut FxHashSet<usize>,
) {
    let specific: FxHashSet<&str> = candidates
        .iter()
        .map(|&i| &assets[i])
        .filter(|asset| asset.asset_kind != AssetKind::All)
        .map(|asset| asset.source_id.as_str())
        .collect();

    candidates.retain(|&i| {
        let asset = &assets[i];
        let keep = asset.asset_kind != AssetKind::All || !specific.contains(asset.source_id.as_str());
        if !keep {
            dropped.insert(i);
        }
        keep
    });
}

/// Indices of non-primary assets whose chain of related assets reaches a
/// dropped asset.
fn orphaned_dependents(assets: &[StaticAsset], dropped: &FxHashSet<&str>) -> FxHashSet<usize> {
    let by_identity: FxHashMap<&str, &StaticAsset> =
        assets.iter().map(|a| (a.identity.as_str(), a)).collect();

    let mut orphans = FxHashSet::default();
    for (index, asset) in assets.iter().enumerate() {
        let mut current = asset;
        let mut depth = 0;
        while !current.is_primary() && depth < assets.len() {
            if dropped.contains(current.related_asset.as_str()) {
                orphans.insert(index);
                break;
            }
            match by_identity.get(current.related_asset.as_str()) {
                Some(parent) => current = parent,
                None => break,
            }
            depth += 1;
        }
    }
    orphans
}

// ============================================================================
// Physical conflicts
// ============================================================================

/// Output files (relative to the output wwwroot) that assets must not shadow.
pub fn detect_physical_conflicts<'a, I>(
    assets: &[StaticAsset],
    files: I,
) -> Result<Vec<PhysicalConflict>, PatternError>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let files: FxHashMap<String, String> = files
        .into_iter()
        .map(|(target, file)| (normalize_route(target), file))
        .collect();
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let mut conflicts = Vec::new();
    for asset in assets {
        let route = asset.target_path()?;
        if let Some(file) = files.get(&route) {
            conflicts.push(PhysicalConflict {
                route,
                identity: asset.identity.clone(),
                file: file.clone(),
            });
        }
    }
    conflicts.sort_by(|a, b| a.route.cmp(&b.route).then(a.identity.cmp(&b.identity)));
    Ok(conflicts)
}

// ============================================================================
// Reporting
// ============================================================================

/// Print conflicts using the standard log format.
///
/// Output format:
/// ```text
/// [error] route conflicts (1 route, 2 assets)
/// [route] js/app.js (2 assets)
///   - /src/App/wwwroot/js/app.js
///   - /src/Lib/wwwroot/js/app.js
/// ```
pub fn print_conflicts(conflicts: &[RouteConflict]) {
    if conflicts.is_empty() {
        return;
    }

    let total: usize = conflicts.iter().map(|c| c.identities.len()).sum();
    log!("error"; "route conflicts ({} route{}, {} asset{})",
        conflicts.len(), plural_s(conflicts.len()),
        total, plural_s(total));

    for conflict in conflicts {
        eprintln!();
        log!("route"; "{} ({} asset{})", conflict.route, conflict.identities.len(), plural_s(conflict.identities.len()));
        for identity in &conflict.identities {
            eprintln!("  - {identity}");
        }
    }
}

pub fn print_physical_conflicts(conflicts: &[PhysicalConflict]) {
    if conflicts.is_empty() {
        return;
    }
    log!("error"; "{} asset{} shadowed by output files", conflicts.len(), plural_s(conflicts.len()));
    for conflict in conflicts {
        eprintln!("  - {conflict}");
    }
}

/// Format conflicts as a string (for error messages).
pub fn format_conflicts(conflicts: &[RouteConflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| conflict.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_physical(conflicts: &[PhysicalConflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| format!("  - {conflict}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for RouteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.route, self.identities.len())?;
        for identity in &self.identities {
            write!(f, "\n  - {identity}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PhysicalConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} and {}", self.route, self.identity, self.file)
    }
}
