//! Per-asset endpoint definition.

use crate::asset::pattern::FINGERPRINT_TOKEN;
use crate::asset::{PatternError, ResolvedPath, StaticAsset};
use crate::utils::mime;

use super::{EndpointProperty, ResponseHeader, StaticAssetEndpoint, names};

const IMMUTABLE: &str = "max-age=31536000, immutable";
const NO_CACHE: &str = "no-cache";

/// Endpoints of every asset that is served by the current project.
///
/// Local assets in `Reference` mode exist only for referencing projects and
/// get no endpoints here.
pub fn define_endpoints(assets: &[StaticAsset]) -> Result<Vec<StaticAssetEndpoint>, PatternError> {
    let mut endpoints = Vec::new();
    for asset in assets {
        if asset.source_type.is_current_project() && !asset.asset_mode.visible_to_current_project() {
            continue;
        }
        endpoints.extend(endpoints_for(asset)?);
    }
    Ok(endpoints)
}

/// One endpoint per route the asset is reachable at.
pub fn endpoints_for(asset: &StaticAsset) -> Result<Vec<StaticAssetEndpoint>, PatternError> {
    let label = asset.label()?;
    Ok(asset
        .routes()?
        .into_iter()
        .map(|route| endpoint_for_route(asset, route, &label))
        .collect())
}

fn endpoint_for_route(asset: &StaticAsset, route: ResolvedPath, label: &str) -> StaticAssetEndpoint {
    let fingerprint = route.token(FINGERPRINT_TOKEN).map(str::to_string);

    let mut properties = vec![EndpointProperty::new(
        names::INTEGRITY,
        format!("sha256-{}", asset.integrity),
    )];
    if let Some(fingerprint) = &fingerprint {
        properties.push(EndpointProperty::new(names::FINGERPRINT, fingerprint.as_str()));
        properties.push(EndpointProperty::new(names::LABEL, label));
    }

    let cache_control = if fingerprint.is_some() { IMMUTABLE } else { NO_CACHE };
    let headers = vec![
        ResponseHeader::new(names::ACCEPT_RANGES, "bytes"),
        ResponseHeader::new(names::CACHE_CONTROL, cache_control),
        ResponseHeader::new(names::CONTENT_LENGTH, asset.file_length.to_string()),
        ResponseHeader::new(names::CONTENT_TYPE, mime::from_route(&route.path)),
        ResponseHeader::new(names::ETAG, format!("\"{}\"", asset.integrity)),
        ResponseHeader::new(names::LAST_MODIFIED, asset.last_write_time.as_str()),
    ];

    StaticAssetEndpoint {
        route: route.path,
        asset_file: asset.identity.clone(),
        selectors: Vec::new(),
        endpoint_properties: properties,
        response_headers: headers,
    }
}
