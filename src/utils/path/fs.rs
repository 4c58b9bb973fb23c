//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_path` - resolve relative paths against a project directory
//! - `relative_slash` - path below a root, rendered with `/` separators

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a configured path against the project directory.
///
/// Absolute paths are returned unchanged; relative paths are joined with
/// `base_dir`. The result is not required to exist.
#[inline]
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Path of `path` below `root`, joined with `/`.
///
/// Returns `None` when `path` is not inside `root`.
pub fn relative_slash(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Render a content root directory with a trailing separator.
pub fn content_root_string(dir: &Path) -> String {
    let mut root = dir.to_string_lossy().into_owned();
    if !root.ends_with(MAIN_SEPARATOR) && !root.ends_with('/') {
        root.push(MAIN_SEPARATOR);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/project");
        assert_eq!(
            resolve_path(Path::new("wwwroot"), base),
            PathBuf::from("/project/wwwroot")
        );
        assert_eq!(
            resolve_path(Path::new("/elsewhere"), base),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn test_relative_slash() {
        let root = Path::new("/project/wwwroot");
        assert_eq!(
            relative_slash(Path::new("/project/wwwroot/css/site.css"), root),
            Some("css/site.css".to_string())
        );
        assert_eq!(relative_slash(Path::new("/other/file.js"), root), None);
    }

    #[test]
    fn test_content_root_string() {
        let root = content_root_string(Path::new("/project/wwwroot"));
        assert!(root.ends_with(MAIN_SEPARATOR));
        assert_eq!(content_root_string(Path::new("/a/")), "/a/");
    }
}
