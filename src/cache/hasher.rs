//! Fingerprint computation for stage inputs using BLAKE3

use crate::types::Hash;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Content fingerprint of a single input file.
///
/// `hash` is `None` when the file could not be read; such a fingerprint never
/// matches anything, including another `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub path: PathBuf,
    pub hash: Option<String>,
}

impl FileFingerprint {
    /// Read and hash the file at `path`
    pub fn of(path: &Path) -> Self {
        let hash = fs::read(path)
            .ok()
            .map(|bytes| hex::encode(compute_content_hash(&bytes)));
        FileFingerprint {
            path: path.to_path_buf(),
            hash,
        }
    }

    /// True if both fingerprints name the same path with the same known content
    pub fn same_as(&self, other: &FileFingerprint) -> bool {
        match (&self.hash, &other.hash) {
            (Some(a), Some(b)) => self.path == other.path && a == b,
            _ => false,
        }
    }
}

/// Fingerprint every path, preserving order
pub fn fingerprint_files<P: AsRef<Path>>(paths: &[P]) -> Vec<FileFingerprint> {
    paths.iter().map(|p| FileFingerprint::of(p.as_ref())).collect()
}

/// Compute content hash for file bytes
pub fn compute_content_hash(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Hash a parameter map.
///
/// BTreeMap iteration is sorted, so the digest is independent of insertion order.
pub fn compute_params_hash(params: &BTreeMap<String, String>) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(&(params.len() as u64).to_be_bytes());
    for (key, value) in params.iter() {
        hasher.update(key.as_bytes());
        hasher.update(b":");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    *hasher.finalize().as_bytes()
}

/// True if two files have identical content
pub fn same_content(a: &Path, b: &Path) -> bool {
    let fa = FileFingerprint::of(a);
    let fb = FileFingerprint::of(b);
    match (fa.hash, fb.hash) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
