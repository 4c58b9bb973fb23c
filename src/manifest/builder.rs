//! Manifest construction for one phase.
//!
//! ```text
//! local + referenced assets
//!   -> phase filter (AssetKind)
//!   -> normalize / validate / identity check
//!   -> conflict resolution (address::conflict)
//!   -> physical conflict check
//!   -> endpoints + compression negotiation
//!   -> sort everything, hash the sorted document
//! ```
//!
//! The result depends only on the set of inputs, never on their order.

use crate::address::{
    ConflictError, ResolveContext, detect_physical_conflicts, resolve_conflicts,
};
use crate::asset::{AssetError, ManifestType, StaticAsset};
use crate::endpoint::{apply_compression_negotiation, define_endpoints};
use crate::freshness::hash_bytes;
use crate::debug;

use super::{
    DiscoveryPattern, MANIFEST_VERSION, ManifestError, ReferencedProjectConfiguration,
    StaticWebAssetsManifest,
};

pub struct ManifestBuilder {
    phase: ManifestType,
    ctx: ResolveContext,
    discovery_patterns: Vec<DiscoveryPattern>,
    references: Vec<ReferencedProjectConfiguration>,
    /// `(target below the output wwwroot, source file)` of plain copied files.
    output_files: Vec<(String, String)>,
}

impl ManifestBuilder {
    pub fn new(source: &str, phase: ManifestType) -> Self {
        Self {
            phase,
            ctx: ResolveContext::new(source),
            discovery_patterns: Vec::new(),
            references: Vec::new(),
            output_files: Vec::new(),
        }
    }

    pub fn resolve_context(mut self, ctx: ResolveContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn discovery_patterns(mut self, patterns: Vec<DiscoveryPattern>) -> Self {
        self.discovery_patterns = patterns;
        self
    }

    pub fn references(mut self, references: Vec<ReferencedProjectConfiguration>) -> Self {
        self.references = references;
        self
    }

    pub fn output_files(mut self, files: Vec<(String, String)>) -> Self {
        self.output_files = files;
        self
    }

    /// Build the manifest from every candidate asset (both phases).
    pub fn build(&self, candidates: &[StaticAsset]) -> Result<StaticWebAssetsManifest, ManifestError> {
        let assets = self.phase_assets(candidates)?;
        let mut assets = resolve_conflicts(assets, &self.ctx)?;

        let physical = detect_physical_conflicts(
            &assets,
            self.output_files
                .iter()
                .map(|(target, file)| (target.as_str(), file.clone())),
        )
        .map_err(ConflictError::from)?;
        if !physical.is_empty() {
            return Err(ConflictError::Physical(physical).into());
        }

        let endpoints = define_endpoints(&assets).map_err(crate::endpoint::EndpointError::from)?;
        let mut endpoints = apply_compression_negotiation(&assets, endpoints)?;

        assets.sort();
        for endpoint in &mut endpoints {
            endpoint.normalize();
        }
        endpoints.sort();
        endpoints.dedup();

        let mut discovery_patterns = self.discovery_patterns.clone();
        discovery_patterns.sort();
        discovery_patterns.dedup();
        let mut references = self.references.clone();
        references.sort();
        references.dedup();

        let mut manifest = StaticWebAssetsManifest {
            version: MANIFEST_VERSION,
            hash: String::new(),
            source: self.ctx.source_id.clone(),
            manifest_type: self.phase,
            referenced_projects_configuration: references,
            discovery_patterns,
            assets,
            endpoints,
        };
        manifest.hash = hash_bytes(&serde_json::to_vec(&manifest)?).to_hex();

        debug!(self.phase.as_str(); "{} assets, {} endpoints, hash {}",
            manifest.assets.len(), manifest.endpoints.len(), &manifest.hash[..16]);
        Ok(manifest)
    }

    /// Candidates of this phase, normalized, validated and unique by identity.
    fn phase_assets(&self, candidates: &[StaticAsset]) -> Result<Vec<StaticAsset>, AssetError> {
        let mut assets: Vec<StaticAsset> = candidates
            .iter()
            .filter(|asset| asset.asset_kind.includes(self.phase))
            .cloned()
            .collect();

        for asset in &mut assets {
            asset.normalize();
            asset.validate()?;
        }

        assets.sort();
        assets.dedup();
        if let Some(pair) = assets
            .windows(2)
            .find(|pair| pair[0].identity == pair[1].identity)
        {
            return Err(AssetError::Invalid {
                identity: pair[0].identity.clone(),
                reason: format!(
                    "claimed by both {} ({:?}) and {} ({:?})",
                    pair[0].source_id, pair[0].source_type, pair[1].source_id, pair[1].source_type
                ),
            });
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetKind, AssetRole, CONTENT_ENCODING, SourceType, make_asset};
    use crate::endpoint::names;

    fn gzip_of(primary: &StaticAsset) -> StaticAsset {
        let pattern = primary.pattern().unwrap().embed(primary);
        let mut gzip = make_asset(&primary.source_id, SourceType::Computed, &format!("{pattern}.gz"));
        gzip.identity = format!("{}.gz", primary.identity.replace("wwwroot", "obj/compressed"));
        gzip.asset_role = AssetRole::Alternative;
        gzip.related_asset = primary.identity.clone();
        gzip.asset_trait_name = CONTENT_ENCODING.to_string();
        gzip.asset_trait_value = "gzip".to_string();
        gzip.integrity = "Z3ppcA==".to_string();
        gzip
    }

    fn sample() -> Vec<StaticAsset> {
        let app = make_asset("App", SourceType::Discovered, "js/app#[.{fingerprint}]?.js");
        let site = make_asset("App", SourceType::Discovered, "css/site.css");
        let mut lib = make_asset("Lib", SourceType::Project, "lib#[.{fingerprint}]!.js");
        lib.fingerprint = "abcdef0123".to_string();
        let gzip = gzip_of(&app);
        vec![app, site, lib, gzip]
    }

    fn builder(phase: ManifestType) -> ManifestBuilder {
        ManifestBuilder::new("App", phase)
            .resolve_context(ResolveContext::new("App").with_direct_references(["Lib"]))
            .discovery_patterns(vec![DiscoveryPattern {
                name: "App\\wwwroot".to_string(),
                source: "App".to_string(),
                content_root: "/projects/App/wwwroot/".to_string(),
                base_path: "/".to_string(),
                pattern: "**".to_string(),
            }])
    }

    #[test]
    fn test_manifest_is_order_independent() {
        let assets = sample();
        let first = builder(ManifestType::Build).build(&assets).unwrap();

        let mut reversed = assets.clone();
        reversed.reverse();
        let second = builder(ManifestType::Build).build(&reversed).unwrap();

        let mut rotated = assets.clone();
        rotated.rotate_left(2);
        let third = builder(ManifestType::Build).build(&rotated).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(first.to_json().unwrap(), third.to_json().unwrap());
        assert_eq!(first.hash.len(), 64);
    }

    #[test]
    fn test_manifest_is_sorted() {
        let manifest = builder(ManifestType::Build).build(&sample()).unwrap();
        assert!(manifest.assets.windows(2).all(|w| w[0].identity < w[1].identity));
        assert!(manifest.endpoints.windows(2).all(|w| w[0] <= w[1]));
        for endpoint in &manifest.endpoints {
            assert!(endpoint.response_headers.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_hash_tracks_content() {
        let assets = sample();
        let first = builder(ManifestType::Build).build(&assets).unwrap();

        let mut changed = assets.clone();
        changed[1].integrity = "Y2hhbmdlZA==".to_string();
        let second = builder(ManifestType::Build).build(&changed).unwrap();
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_phase_filter() {
        let mut assets = sample();
        assets[1].asset_kind = AssetKind::Build;
        assets[3].asset_kind = AssetKind::Publish;

        let build = builder(ManifestType::Build).build(&assets).unwrap();
        assert!(build.assets.iter().any(|a| a.relative_path == "css/site.css"));
        assert!(!build.assets.iter().any(|a| a.is_compressed()));

        let publish = builder(ManifestType::Publish).build(&assets).unwrap();
        assert!(!publish.assets.iter().any(|a| a.relative_path == "css/site.css"));
        assert!(publish.assets.iter().any(|a| a.is_compressed()));
        assert_eq!(publish.manifest_type, ManifestType::Publish);
    }

    #[test]
    fn test_conflict_names_both_identities() {
        let mut a = make_asset("PkgA", SourceType::Package, "x.js");
        let mut b = make_asset("PkgB", SourceType::Package, "x.js");
        a.base_path = "/".to_string();
        b.base_path = "/".to_string();

        let err = builder(ManifestType::Build)
            .build(&[a.clone(), b.clone()])
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ManifestError::Conflict(ConflictError::Routes(_))));
        assert!(message.contains(&a.identity));
        assert!(message.contains(&b.identity));
    }

    #[test]
    fn test_physical_conflict_is_fatal() {
        let explicit = make_asset("App", SourceType::Computed, "robots.txt");
        let err = builder(ManifestType::Build)
            .output_files(vec![(
                "robots.txt".to_string(),
                "/projects/App/robots.txt".to_string(),
            )])
            .build(&[explicit])
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Conflict(ConflictError::Physical(_))
        ));
    }

    #[test]
    fn test_duplicate_identity_is_rejected() {
        let a = make_asset("App", SourceType::Discovered, "a.js");
        let mut b = a.clone();
        b.source_type = SourceType::Computed;
        let err = builder(ManifestType::Build).build(&[a, b]).unwrap_err();
        assert!(matches!(err, ManifestError::Asset(AssetError::Invalid { .. })));
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let a = make_asset("App", SourceType::Discovered, "a.js");
        let manifest = builder(ManifestType::Build).build(&[a.clone(), a]).unwrap();
        assert_eq!(manifest.assets.len(), 1);
    }

    #[test]
    fn test_selector_etag_matches_primary() {
        let manifest = builder(ManifestType::Build).build(&sample()).unwrap();
        let primary = manifest
            .endpoints
            .iter()
            .find(|e| e.route == "js/app.js" && e.selectors.is_empty())
            .unwrap();
        let selector = manifest
            .endpoints
            .iter()
            .find(|e| e.route == "js/app.js" && !e.selectors.is_empty())
            .unwrap();
        let weak = selector
            .headers(names::ETAG)
            .find(|v| v.starts_with("W/"))
            .unwrap();
        assert_eq!(&weak[2..], primary.header(names::ETAG).unwrap());
    }

    #[test]
    fn test_invalid_asset_is_rejected() {
        let mut asset = make_asset("App", SourceType::Discovered, "a.js");
        asset.integrity.clear();
        let err = builder(ManifestType::Build).build(&[asset]).unwrap_err();
        assert!(matches!(err, ManifestError::Asset(_)));
    }
}
