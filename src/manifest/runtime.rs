//! Runtime (development) manifest.
//!
//! A path tree over the build manifest used for dev-time static file
//! serving. Each route segment is a child node; leaves point at a content
//! root by index plus the file path below it.
//!
//! ```json
//! {
//!   "ContentRoots": ["/src/App/wwwroot/"],
//!   "Root": {
//!     "Children": {
//!       "css": { "Children": { "site.css": { "Asset": { "ContentRootIndex": 0, "SubPath": "css/site.css" } } } }
//!     },
//!     "Patterns": [{ "ContentRootIndex": 0, "Pattern": "**", "Depth": 0 }]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::PatternError;
use crate::freshness::write_if_changed;

use super::{ManifestError, StaticWebAssetsManifest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuntimeAsset {
    pub content_root_index: usize,
    pub sub_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuntimePattern {
    pub content_root_index: usize,
    pub pattern: String,
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuntimeNode {
    pub children: Option<BTreeMap<String, RuntimeNode>>,
    pub asset: Option<RuntimeAsset>,
    pub patterns: Option<Vec<RuntimePattern>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuntimeManifest {
    pub content_roots: Vec<String>,
    pub root: RuntimeNode,
}

impl RuntimeManifest {
    /// Build the tree from a (build) manifest. Only primary assets served by
    /// the project are included, under every route they expand to.
    pub fn from_manifest(manifest: &StaticWebAssetsManifest) -> Result<Self, PatternError> {
        let mut runtime = Self {
            content_roots: Vec::new(),
            root: RuntimeNode::default(),
        };

        for asset in &manifest.assets {
            let served = !asset.source_type.is_current_project()
                || asset.asset_mode.visible_to_current_project();
            if !asset.is_primary() || !served {
                continue;
            }
            let index = runtime.content_root_index(&asset.content_root);
            for route in asset.routes()? {
                runtime.insert(
                    &route.path,
                    RuntimeAsset {
                        content_root_index: index,
                        sub_path: asset.sub_path().replace('\\', "/"),
                    },
                );
            }
        }

        let mut patterns = Vec::new();
        for discovery in &manifest.discovery_patterns {
            let index = runtime.content_root_index(&discovery.content_root);
            let depth = discovery
                .base_path
                .split('/')
                .filter(|s| !s.is_empty())
                .count();
            for pattern in discovery.pattern.split(';').filter(|p| !p.is_empty()) {
                patterns.push(RuntimePattern {
                    content_root_index: index,
                    pattern: pattern.to_string(),
                    depth,
                });
            }
        }
        if !patterns.is_empty() {
            runtime.root.patterns = Some(patterns);
        }
        Ok(runtime)
    }

    fn content_root_index(&mut self, content_root: &str) -> usize {
        match self.content_roots.iter().position(|r| r == content_root) {
            Some(index) => index,
            None => {
                self.content_roots.push(content_root.to_string());
                self.content_roots.len() - 1
            }
        }
    }

    /// Insert a leaf. The first asset claiming a route keeps it.
    fn insert(&mut self, route: &str, asset: RuntimeAsset) {
        let mut node = &mut self.root;
        for segment in route.split('/').filter(|s| !s.is_empty()) {
            node = node
                .children
                .get_or_insert_with(BTreeMap::new)
                .entry(segment.to_string())
                .or_default();
        }
        if node.asset.is_none() {
            node.asset = Some(asset);
        }
    }

    /// Find the asset served at `route`.
    pub fn lookup(&self, route: &str) -> Option<&RuntimeAsset> {
        let mut node = &self.root;
        for segment in route.split('/').filter(|s| !s.is_empty()) {
            node = node.children.as_ref()?.get(segment)?;
        }
        node.asset.as_ref()
    }

    pub fn write(&self, path: &Path) -> Result<bool, ManifestError> {
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        write_if_changed(path, &json).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetMode, AssetRole, ManifestType, SourceType, make_asset};
    use crate::manifest::{DiscoveryPattern, ManifestBuilder};

    fn manifest() -> StaticWebAssetsManifest {
        let app = make_asset("App", SourceType::Discovered, "js/app#[.{fingerprint}]?.js");
        let lib = make_asset("Lib", SourceType::Project, "lib.css");
        let mut hidden = make_asset("App", SourceType::Discovered, "ref-only.js");
        hidden.asset_mode = AssetMode::Reference;
        let mut related = make_asset("App", SourceType::Computed, "js/app.js.map");
        related.asset_role = AssetRole::Related;
        related.related_asset = app.identity.clone();

        ManifestBuilder::new("App", ManifestType::Build)
            .discovery_patterns(vec![DiscoveryPattern {
                name: "App\\wwwroot".to_string(),
                source: "App".to_string(),
                content_root: "/projects/App/wwwroot/".to_string(),
                base_path: "/".to_string(),
                pattern: "**/*.js;**/*.css".to_string(),
            }])
            .build(&[app, lib, hidden, related])
            .unwrap()
    }

    #[test]
    fn test_tree_contains_every_route() {
        let runtime = RuntimeManifest::from_manifest(&manifest()).unwrap();

        let plain = runtime.lookup("js/app.js").unwrap();
        assert_eq!(plain.sub_path, "js/app.js");
        assert_eq!(runtime.content_roots[plain.content_root_index], "/projects/App/wwwroot/");
        assert_eq!(runtime.lookup("js/app.1234asdf.js"), Some(plain));

        let lib = runtime.lookup("_content/Lib/lib.css").unwrap();
        assert_eq!(runtime.content_roots[lib.content_root_index], "/projects/Lib/wwwroot/");
        assert_eq!(lib.sub_path, "lib.css");
    }

    #[test]
    fn test_tree_skips_unserved_and_non_primary() {
        let runtime = RuntimeManifest::from_manifest(&manifest()).unwrap();
        assert!(runtime.lookup("ref-only.js").is_none());
        assert!(runtime.lookup("js/app.js.map").is_none());
        assert!(runtime.lookup("js").is_none());
    }

    #[test]
    fn test_patterns() {
        let runtime = RuntimeManifest::from_manifest(&manifest()).unwrap();
        let patterns = runtime.root.patterns.as_ref().unwrap();
        let globs: Vec<_> = patterns.iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(globs, vec!["**/*.js", "**/*.css"]);
        assert!(patterns.iter().all(|p| p.depth == 0));
    }

    #[test]
    fn test_json_shape() {
        let runtime = RuntimeManifest::from_manifest(&manifest()).unwrap();
        let json = serde_json::to_value(&runtime).unwrap();
        assert!(json["ContentRoots"].is_array());
        let leaf = &json["Root"]["Children"]["js"]["Children"]["app.js"]["Asset"];
        assert_eq!(leaf["SubPath"], "js/app.js");
        assert_eq!(json["Root"]["Asset"], serde_json::Value::Null);
    }
}
