//! Precompressed variants (gzip, brotli) of primary assets.
//!
//! Each variant is an `Alternative` asset linked to its primary through
//! `RelatedAsset` and tagged `Content-Encoding=<gzip|br>`. Its relative path
//! is the primary's pattern with the primary's token values embedded, so
//! `app#[.{fingerprint}]?.js` becomes `app#[.{fingerprint=abc}]?.js.gz` and
//! the variant routes line up with the primary routes.
//!
//! Variant files mirror the primary's source path below the project root
//! (`wwwroot/js/app.js` becomes `compressed/wwwroot/js/app.js.gz`). Two
//! primaries that claim one route therefore never share a variant file, and
//! route precedence decides later which pair survives.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use globset::GlobSet;
use rayon::prelude::*;

use super::discover::build_glob_set;
use super::integrity::digest_bytes;
use super::kind::{AssetKind, AssetRole, SourceType};
use super::model::{CONTENT_ENCODING, StaticAsset};
use crate::config::{CompressionFormat, ProjectConfig};
use crate::freshness::{hash_bytes, write_if_changed};
use crate::logger::ProgressLine;
use crate::utils::date::http_date;
use crate::utils::path::{content_root_string, relative_slash};
use crate::debug;

/// Variants produced by one compression pass.
#[derive(Debug, Default)]
pub struct CompressedAssets {
    pub assets: Vec<StaticAsset>,
    /// Files rewritten because their content changed.
    pub written: usize,
}

impl CompressedAssets {
    pub fn files(&self) -> Vec<PathBuf> {
        self.assets
            .iter()
            .map(|asset| PathBuf::from(&asset.identity))
            .collect()
    }
}

/// Compress `data` in the given format. Output is deterministic.
pub fn compress_bytes(data: &[u8], format: CompressionFormat) -> std::io::Result<Vec<u8>> {
    match format {
        CompressionFormat::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
            encoder.write_all(data)?;
            encoder.finish()
        }
        CompressionFormat::Brotli => {
            let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
            writer.write_all(data)?;
            writer.flush()?;
            Ok(writer.into_inner())
        }
    }
}

/// Kind of a variant whose primary has `primary` kind, or `None` when the
/// format is not produced for any phase the primary belongs to.
fn variant_kind(primary: AssetKind, format_kind: AssetKind) -> Option<AssetKind> {
    match (primary, format_kind) {
        (AssetKind::All, kind) => Some(kind),
        (kind, AssetKind::All) => Some(kind),
        (a, b) if a == b => Some(a),
        _ => None,
    }
}

struct Job<'a> {
    primary: &'a StaticAsset,
    format: CompressionFormat,
    kind: AssetKind,
    /// Variant path below the compressed directory, without extension.
    stem: String,
}

/// Generate compressed variants for every eligible primary asset.
pub fn compress_assets(config: &ProjectConfig, assets: &[StaticAsset]) -> Result<CompressedAssets> {
    let formats = config.compression.formats();
    if formats.is_empty() {
        return Ok(CompressedAssets::default());
    }

    let include = build_glob_set(&config.compression.include).context("compression.include")?;
    let exclude = build_glob_set(&config.compression.exclude).context("compression.exclude")?;

    let mut jobs = Vec::new();
    for primary in assets {
        if !is_eligible(config, primary, &include, &exclude) {
            continue;
        }
        let stem = variant_stem(&config.root, primary);
        for &format in &formats {
            if let Some(kind) = variant_kind(primary.asset_kind, config.compression.kind_of(format)) {
                jobs.push(Job {
                    primary,
                    format,
                    kind,
                    stem: stem.clone(),
                });
            }
        }
    }

    let compressed_dir = config.compressed_dir();
    let progress = ProgressLine::new(&[("compress", jobs.len())]);
    let results: Vec<(StaticAsset, bool)> = jobs
        .par_iter()
        .map(|job| {
            let result = compress_one(job, &compressed_dir);
            progress.inc("compress");
            result
        })
        .collect::<Result<_>>()?;
    progress.finish();

    let written = results.iter().filter(|(_, changed)| *changed).count();
    debug!("compress"; "{} variants, {} rewritten", results.len(), written);
    Ok(CompressedAssets {
        assets: results.into_iter().map(|(asset, _)| asset).collect(),
        written,
    })
}

fn is_eligible(
    config: &ProjectConfig,
    primary: &StaticAsset,
    include: &GlobSet,
    exclude: &GlobSet,
) -> bool {
    if !primary.is_primary() || !primary.source_type.is_current_project() {
        return false;
    }
    if primary.file_length < config.compression.min_size {
        return false;
    }
    let Ok(pattern) = primary.pattern() else {
        return false;
    };
    let label = pattern.label();
    include.is_match(&label) && !exclude.is_match(&label)
}

/// Source path of `primary` below the project root. Files outside the root
/// go under `external/<identity hash>/<file name>`.
fn variant_stem(root: &Path, primary: &StaticAsset) -> String {
    let identity = Path::new(&primary.identity);
    if let Some(relative) = relative_slash(identity, root).filter(|r| !r.is_empty()) {
        return relative;
    }
    let key = hash_bytes(primary.identity.as_bytes()).to_hex();
    let name = identity
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("external/{}/{name}", &key[..12])
}

fn compress_one(job: &Job<'_>, compressed_dir: &Path) -> Result<(StaticAsset, bool)> {
    let primary = job.primary;
    let data = fs::read(&primary.identity)
        .with_context(|| format!("failed to read {}", primary.identity))?;
    let compressed = compress_bytes(&data, job.format)
        .with_context(|| format!("failed to compress {}", primary.identity))?;

    let path = compressed_dir.join(format!("{}.{}", job.stem, job.format.extension()));
    let changed = write_if_changed(&path, &compressed)
        .with_context(|| format!("failed to write {}", path.display()))?;
    let modified = fs::metadata(&path)
        .and_then(|m| m.modified())
        .with_context(|| format!("failed to stat {}", path.display()))?;

    let pattern = primary.pattern()?.embed(primary);
    let digest = digest_bytes(&compressed);

    let asset = StaticAsset {
        identity: path.to_string_lossy().into_owned(),
        source_id: primary.source_id.clone(),
        source_type: SourceType::Computed,
        content_root: content_root_string(compressed_dir),
        base_path: primary.base_path.clone(),
        relative_path: format!("{pattern}.{}", job.format.extension()),
        asset_kind: job.kind,
        asset_mode: primary.asset_mode,
        asset_role: AssetRole::Alternative,
        related_asset: primary.identity.clone(),
        asset_trait_name: CONTENT_ENCODING.to_string(),
        asset_trait_value: job.format.encoding().to_string(),
        fingerprint: digest.fingerprint,
        integrity: digest.integrity,
        copy_to_output_directory: primary.copy_to_output_directory,
        copy_to_publish_directory: primary.copy_to_publish_directory,
        file_length: compressed.len() as u64,
        last_write_time: http_date(modified),
    };
    Ok((asset, changed))
}
