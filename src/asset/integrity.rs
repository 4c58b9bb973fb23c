//! Content fingerprint and integrity computation.
//!
//! - Integrity: base64 (standard alphabet) of the SHA-256 digest.
//! - Fingerprint: the digest as a big-endian integer, reduced modulo 36^10
//!   and written as exactly 10 lowercase base-36 digits.
//!
//! Both are pure functions of the content bytes.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::SystemTime;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::utils::date::http_date;

/// Length of a fingerprint token.
pub const FINGERPRINT_LEN: usize = 10;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Content-derived identifiers of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    pub fingerprint: String,
    pub integrity: String,
}

impl ContentDigest {
    fn from_sha256(digest: &[u8]) -> Self {
        Self {
            fingerprint: fingerprint_of(digest),
            integrity: STANDARD.encode(digest),
        }
    }
}

/// Digest plus the file metadata used by endpoint headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub digest: ContentDigest,
    pub length: u64,
    /// HTTP date of the last modification.
    pub last_write_time: String,
}

/// Digest an in-memory buffer.
pub fn digest_bytes(bytes: &[u8]) -> ContentDigest {
    ContentDigest::from_sha256(&Sha256::digest(bytes))
}

/// Stream a file through SHA-256 and collect its length and modification time.
pub fn digest_file(path: &Path) -> io::Result<FileDigest> {
    let file = File::open(path)?;
    let modified = file.metadata()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    let mut length = 0u64;

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
                length += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(FileDigest {
        digest: ContentDigest::from_sha256(&hasher.finalize()),
        length,
        last_write_time: http_date(modified),
    })
}

/// 36^10, the fingerprint space.
const FINGERPRINT_SPACE: u128 = 3_656_158_440_062_976;

fn fingerprint_of(digest: &[u8]) -> String {
    let mut value = digest
        .iter()
        .fold(0u128, |acc, b| (acc * 256 + u128::from(*b)) % FINGERPRINT_SPACE);

    let mut out = [b'0'; FINGERPRINT_LEN];
    for slot in out.iter_mut().rev() {
        *slot = BASE36[(value % 36) as usize];
        value /= 36;
    }
    out.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_shape() {
        let digest = digest_bytes(b"console.log('hello');");
        assert_eq!(digest.fingerprint.len(), FINGERPRINT_LEN);
        assert!(
            digest
                .fingerprint
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(digest_bytes(b"body {}"), digest_bytes(b"body {}"));
        assert_ne!(
            digest_bytes(b"body {}").fingerprint,
            digest_bytes(b"body { }").fingerprint
        );
    }

    #[test]
    fn test_empty_content_is_deterministic() {
        let digest = digest_bytes(b"");
        // SHA-256 of the empty input
        assert_eq!(
            digest.integrity,
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
        assert_eq!(digest, digest_bytes(b""));
    }

    #[test]
    fn test_fingerprint_of_zero_digest() {
        assert_eq!(fingerprint_of(&[0u8; 32]), "0000000000");
        assert_eq!(fingerprint_of(&[35]), "000000000z");
        assert_eq!(fingerprint_of(&[1, 0]), "0000000074");
    }

    #[test]
    fn test_digest_file_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        let content = vec![b'x'; 200_000];
        fs::write(&path, &content).unwrap();

        let file = digest_file(&path).unwrap();
        assert_eq!(file.digest, digest_bytes(&content));
        assert_eq!(file.length, 200_000);
        assert!(file.last_write_time.ends_with(" GMT"));
    }

    #[test]
    fn test_digest_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = digest_file(&dir.path().join("gone.js")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
