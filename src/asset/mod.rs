//! Static web assets: the record, its path patterns and how assets are
//! produced from the project (discovery, fingerprinting, compression).

pub mod compress;
pub mod discover;
pub mod integrity;
mod kind;
mod model;
pub mod pattern;

// Types
pub use kind::{AssetKind, AssetMode, AssetRole, CopyOption, ManifestType, SourceType};
pub use model::{AssetError, CONTENT_ENCODING, StaticAsset};
pub use pattern::{PathPattern, PatternError, ResolvedPath, TokenSource};

// Production (side effects)
pub use compress::{CompressedAssets, compress_assets};
pub use discover::{DiscoveredAssets, discover, discovery_patterns, input_files};
pub use integrity::{ContentDigest, digest_bytes, digest_file};

#[cfg(test)]
pub(crate) use model::tests::make_asset;
