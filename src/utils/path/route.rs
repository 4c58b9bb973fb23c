//! Route string helpers.
//!
//! Routes and relative paths are stored with `/` separators and without
//! leading or trailing slashes, so `"/css\\site.css/"` and `"css/site.css"`
//! compare equal after normalization.

/// Normalize a route or relative path: `\` becomes `/`, duplicate slashes
/// collapse and outer slashes are trimmed.
pub fn normalize_route(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a base path. An empty base path is the root, `/`.
pub fn base_path_or_root(base_path: &str) -> String {
    let normalized = normalize_route(base_path);
    if normalized.is_empty() {
        "/".to_string()
    } else {
        normalized
    }
}

/// Join two route fragments. `/` and empty fragments contribute nothing.
pub fn join_route(prefix: &str, path: &str) -> String {
    let prefix = normalize_route(prefix);
    let path = normalize_route(path);
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path,
        (false, true) => prefix,
        (false, false) => format!("{prefix}/{path}"),
    }
}
