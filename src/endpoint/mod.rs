//! HTTP endpoints derived from static web assets.
//!
//! | Module      | Purpose                                                  |
//! |-------------|----------------------------------------------------------|
//! | `define`    | One endpoint per route of each asset, with base headers  |
//! | `negotiate` | Content-Encoding selector endpoints for compressed files |

mod define;
mod negotiate;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use define::{define_endpoints, endpoints_for};
pub use negotiate::{EndpointError, apply_compression_negotiation};

/// Header and property names used by generated endpoints.
pub mod names {
    pub const ACCEPT_RANGES: &str = "Accept-Ranges";
    pub const CACHE_CONTROL: &str = "Cache-Control";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const ETAG: &str = "ETag";
    pub const LAST_MODIFIED: &str = "Last-Modified";
    pub const VARY: &str = "Vary";
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";

    pub const FINGERPRINT: &str = "fingerprint";
    pub const INTEGRITY: &str = "integrity";
    pub const LABEL: &str = "label";
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointSelector {
    pub name: String,
    pub value: String,
    /// Fixed-point rendering, so ordering and equality stay textual.
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseHeader {
    pub name: String,
    pub value: String,
}

impl EndpointProperty {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

impl ResponseHeader {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// One servable route backed by one asset file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StaticAssetEndpoint {
    pub route: String,
    pub asset_file: String,
    #[serde(default)]
    pub selectors: Vec<EndpointSelector>,
    #[serde(default)]
    pub endpoint_properties: Vec<EndpointProperty>,
    #[serde(default)]
    pub response_headers: Vec<ResponseHeader>,
}

impl StaticAssetEndpoint {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    /// All values of a header that may repeat (`ETag` on selector endpoints).
    pub fn headers<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.response_headers
            .iter()
            .filter(move |h| h.name == name)
            .map(|h| h.value.as_str())
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.endpoint_properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn has_selector(&self, name: &str) -> bool {
        self.selectors.iter().any(|s| s.name == name)
    }

    /// Sort selectors, properties and headers in place.
    pub fn normalize(&mut self) {
        self.selectors.sort();
        self.endpoint_properties.sort();
        self.response_headers.sort();
    }
}

impl PartialOrd for StaticAssetEndpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StaticAssetEndpoint {
    /// Route, then selectors, then asset file.
    fn cmp(&self, other: &Self) -> Ordering {
        self.route
            .cmp(&other.route)
            .then_with(|| self.selectors.cmp(&other.selectors))
            .then_with(|| self.asset_file.cmp(&other.asset_file))
            .then_with(|| self.endpoint_properties.cmp(&other.endpoint_properties))
            .then_with(|| self.response_headers.cmp(&other.response_headers))
    }
}
