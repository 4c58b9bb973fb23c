//! Content-Encoding negotiation between primary and compressed endpoints.
//!
//! For each compressed asset and each of its endpoints:
//!
//! 1. The compressed endpoint (`app.js.gz`) gains `Content-Encoding` and
//!    `Vary: Accept-Encoding`.
//! 2. Every endpoint of the related asset with the same `fingerprint`
//!    property gets a sibling: same route, the compressed file as body, and
//!    a `Content-Encoding` selector weighted by compressed size.
//! 3. Those related endpoints gain `Vary: Accept-Encoding`.
//!
//! The selector endpoint carries the compressed body's headers, the primary's
//! `Content-Type`, and the primary's ETag re-emitted as weak.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::asset::{PatternError, StaticAsset};
use crate::debug;

use super::{EndpointSelector, ResponseHeader, StaticAssetEndpoint, names};

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("compressed asset `{identity}` refers to missing related asset `{related}`")]
    MissingRelatedAsset { identity: String, related: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Selector quality of a compressed body: smaller files rank higher.
fn quality(compressed: &StaticAsset) -> String {
    format!("{:.12}", 1.0 / (compressed.file_length as f64 + 1.0))
}

/// Add compression negotiation to `endpoints` defined for `assets`.
pub fn apply_compression_negotiation(
    assets: &[StaticAsset],
    mut endpoints: Vec<StaticAssetEndpoint>,
) -> Result<Vec<StaticAssetEndpoint>, EndpointError> {
    let by_identity: FxHashMap<&str, &StaticAsset> =
        assets.iter().map(|a| (a.identity.as_str(), a)).collect();

    let mut by_asset: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (index, endpoint) in endpoints.iter().enumerate() {
        by_asset
            .entry(endpoint.asset_file.clone())
            .or_default()
            .push(index);
    }

    let mut selector_endpoints = Vec::new();
    let mut needs_vary: FxHashSet<usize> = FxHashSet::default();

    for compressed in assets.iter().filter(|a| a.is_compressed()) {
        let related = by_identity
            .get(compressed.related_asset.as_str())
            .ok_or_else(|| EndpointError::MissingRelatedAsset {
                identity: compressed.identity.clone(),
                related: compressed.related_asset.clone(),
            })?;

        let Some(compressed_indices) = by_asset.get(&compressed.identity) else {
            continue;
        };
        let related_indices = by_asset
            .get(&related.identity)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let quality = quality(compressed);

        for &ci in compressed_indices {
            if endpoints[ci].has_selector(names::CONTENT_ENCODING) {
                continue;
            }
            add_encoding_headers(&mut endpoints[ci], &compressed.asset_trait_value);

            let compressed_endpoint = &endpoints[ci];
            let fingerprint = compressed_endpoint.property(names::FINGERPRINT);
            for &ri in related_indices {
                let related_endpoint = &endpoints[ri];
                if related_endpoint.property(names::FINGERPRINT) != fingerprint {
                    continue;
                }
                debug!("negotiate"; "{} -> {} ({})", related_endpoint.route, compressed.identity, compressed.asset_trait_value);
                selector_endpoints.push(selector_endpoint(
                    compressed,
                    &quality,
                    compressed_endpoint,
                    related_endpoint,
                ));
                needs_vary.insert(ri);
            }
        }
    }

    for index in needs_vary {
        add_vary(&mut endpoints[index]);
    }
    endpoints.extend(selector_endpoints);
    Ok(endpoints)
}

fn add_encoding_headers(endpoint: &mut StaticAssetEndpoint, encoding: &str) {
    if endpoint.header(names::CONTENT_ENCODING).is_none() {
        endpoint
            .response_headers
            .push(ResponseHeader::new(names::CONTENT_ENCODING, encoding));
    }
    add_vary(endpoint);
}

fn add_vary(endpoint: &mut StaticAssetEndpoint) {
    let present = endpoint
        .headers(names::VARY)
        .any(|value| value.to_ascii_lowercase().contains("accept-encoding"));
    if !present {
        endpoint
            .response_headers
            .push(ResponseHeader::new(names::VARY, names::ACCEPT_ENCODING));
    }
}

fn selector_endpoint(
    compressed: &StaticAsset,
    quality: &str,
    compressed_endpoint: &StaticAssetEndpoint,
    related_endpoint: &StaticAssetEndpoint,
) -> StaticAssetEndpoint {
    let mut selectors = related_endpoint.selectors.clone();
    selectors.push(EndpointSelector {
        name: names::CONTENT_ENCODING.to_string(),
        value: compressed.asset_trait_value.clone(),
        quality: quality.to_string(),
    });

    let compressed_names: FxHashSet<&str> = compressed_endpoint
        .response_headers
        .iter()
        .map(|h| h.name.as_str())
        .collect();

    let mut headers: Vec<ResponseHeader> = compressed_endpoint
        .response_headers
        .iter()
        .filter(|h| h.name != names::CONTENT_TYPE)
        .cloned()
        .collect();
    for header in &related_endpoint.response_headers {
        if !compressed_names.contains(header.name.as_str()) {
            headers.push(header.clone());
        } else if header.name == names::ETAG {
            headers.push(ResponseHeader::new(names::ETAG, format!("W/{}", header.value)));
        } else if header.name == names::CONTENT_TYPE {
            headers.push(header.clone());
        }
    }

    StaticAssetEndpoint {
        route: related_endpoint.route.clone(),
        asset_file: compressed.identity.clone(),
        selectors,
        endpoint_properties: related_endpoint.endpoint_properties.clone(),
        response_headers: headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRole, CONTENT_ENCODING, SourceType, make_asset};
    use crate::endpoint::define_endpoints;

    fn compressed_variant(primary: &StaticAsset, encoding: &str, extension: &str) -> StaticAsset {
        let pattern = primary.pattern().unwrap().embed(primary);
        let mut variant = make_asset(
            &primary.source_id,
            SourceType::Computed,
            &format!("{pattern}.{extension}"),
        );
        variant.identity = format!("/projects/obj/compressed/{}.{extension}", primary.label().unwrap());
        variant.asset_role = AssetRole::Alternative;
        variant.related_asset = primary.identity.clone();
        variant.asset_trait_name = CONTENT_ENCODING.to_string();
        variant.asset_trait_value = encoding.to_string();
        variant.integrity = format!("{encoding}-integrity");
        variant.file_length = 4;
        variant
    }

    fn negotiate(assets: &[StaticAsset]) -> Vec<StaticAssetEndpoint> {
        let endpoints = define_endpoints(assets).unwrap();
        let mut endpoints = apply_compression_negotiation(assets, endpoints).unwrap();
        endpoints.sort();
        endpoints
    }

    #[test]
    fn test_gzip_and_brotli_yield_five_endpoints() {
        let primary = make_asset("App", SourceType::Discovered, "app.js");
        let gzip = compressed_variant(&primary, "gzip", "gz");
        let brotli = compressed_variant(&primary, "br", "br");
        let endpoints = negotiate(&[primary.clone(), gzip.clone(), brotli.clone()]);

        assert_eq!(endpoints.len(), 5);
        let unsuffixed: Vec<_> = endpoints.iter().filter(|e| e.route == "app.js").collect();
        assert_eq!(unsuffixed.len(), 3);
        assert_eq!(unsuffixed.iter().filter(|e| e.selectors.is_empty()).count(), 1);

        for variant in [&gzip, &brotli] {
            let own: Vec<_> = endpoints
                .iter()
                .filter(|e| e.asset_file == variant.identity)
                .collect();
            assert_eq!(own.len(), 2);
            let suffixed = own.iter().find(|e| e.selectors.is_empty()).unwrap();
            assert!(suffixed.route.ends_with(&format!(".{}", variant.asset_trait_value.replace("gzip", "gz"))));
            assert_eq!(
                suffixed.header(names::CONTENT_ENCODING),
                Some(variant.asset_trait_value.as_str())
            );
            assert_eq!(suffixed.header(names::VARY), Some(names::ACCEPT_ENCODING));
        }
    }

    #[test]
    fn test_selector_endpoint_headers() {
        let primary = make_asset("App", SourceType::Discovered, "app.js");
        let gzip = compressed_variant(&primary, "gzip", "gz");
        let endpoints = negotiate(&[primary.clone(), gzip.clone()]);

        let plain = endpoints
            .iter()
            .find(|e| e.asset_file == primary.identity)
            .unwrap();
        assert_eq!(plain.header(names::VARY), Some(names::ACCEPT_ENCODING));
        let strong = plain.header(names::ETAG).unwrap();

        let selector = endpoints
            .iter()
            .find(|e| e.route == "app.js" && !e.selectors.is_empty())
            .unwrap();
        assert_eq!(selector.asset_file, gzip.identity);
        assert_eq!(selector.selectors[0].name, names::CONTENT_ENCODING);
        assert_eq!(selector.selectors[0].value, "gzip");
        assert_eq!(selector.selectors[0].quality, "0.200000000000");
        assert_eq!(selector.header(names::CONTENT_LENGTH), Some("4"));
        assert_eq!(selector.header(names::CONTENT_TYPE), Some(crate::utils::mime::types::JAVASCRIPT));
        assert_eq!(selector.headers(names::CONTENT_TYPE).count(), 1);

        let etags: Vec<_> = selector.headers(names::ETAG).collect();
        assert_eq!(etags.len(), 2);
        assert!(etags.contains(&"\"gzip-integrity\""));
        let weak = etags.iter().find(|e| e.starts_with("W/")).unwrap();
        assert_eq!(weak.trim_start_matches("W/"), strong);
        assert_eq!(
            weak.trim_start_matches("W/").trim_matches('"'),
            primary.integrity
        );
    }

    #[test]
    fn test_pairing_matches_fingerprint() {
        let primary = make_asset("App", SourceType::Discovered, "app#[.{fingerprint}]?.js");
        let gzip = compressed_variant(&primary, "gzip", "gz");
        let endpoints = negotiate(&[primary.clone(), gzip.clone()]);

        // app.js, app.1234asdf.js, app.js.gz, app.1234asdf.js.gz + 2 selectors
        assert_eq!(endpoints.len(), 6);
        let selectors: Vec<_> = endpoints
            .iter()
            .filter(|e| !e.selectors.is_empty())
            .map(|e| (e.route.as_str(), e.property(names::FINGERPRINT)))
            .collect();
        assert_eq!(
            selectors,
            vec![("app.1234asdf.js", Some("1234asdf")), ("app.js", None)]
        );
    }

    #[test]
    fn test_missing_related_asset_is_fatal() {
        let primary = make_asset("App", SourceType::Discovered, "app.js");
        let gzip = compressed_variant(&primary, "gzip", "gz");
        let endpoints = define_endpoints(std::slice::from_ref(&gzip)).unwrap();
        let err = apply_compression_negotiation(&[gzip.clone()], endpoints).unwrap_err();
        assert!(matches!(err, EndpointError::MissingRelatedAsset { .. }));
        assert!(err.to_string().contains(&gzip.identity));
    }
}
