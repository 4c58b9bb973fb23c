//! Path and route utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_path`, `relative_slash`)
//! - [`route`]: Route strings (`normalize_route`, `join_route`, `base_path_or_root`)

pub mod fs;
pub mod route;

pub use fs::{content_root_string, normalize_path, relative_slash, resolve_path};
pub use route::{base_path_or_root, join_route, normalize_route};
