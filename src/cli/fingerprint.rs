//! `swa fingerprint`: content identifiers of a single file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::asset::integrity::{FileDigest, digest_file};

/// Print fingerprint, integrity and length of `file`.
pub fn print_fingerprint(file: &Path) -> Result<()> {
    let digest = digest_file(file).with_context(|| format!("failed to read {}", file.display()))?;
    print!("{}", render(&digest));
    Ok(())
}

fn render(file: &FileDigest) -> String {
    format!(
        "fingerprint  {}\nintegrity    sha256-{}\nlength       {}\nmodified     {}\n",
        file.digest.fingerprint, file.digest.integrity, file.length, file.last_write_time
    )
}
