//! On-disk format for the build cache.
//!
//! The whole cache is one versioned bincode file. Writes go to a `.tmp` sibling
//! which is then renamed over the old file, so a crash leaves either the previous
//! cache or the new one, never a partial record.

use crate::cache::FingerprintRecord;
use crate::error::StorageError;
use crate::types::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CACHE_VERSION: u32 = 1;

/// Persistence format for the build cache
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachePersistence {
    version: u32,
    records: Vec<(Stage, FingerprintRecord)>,
}

/// Load records from disk.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_from_disk(path: &Path) -> Result<Option<BTreeMap<Stage, FingerprintRecord>>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;

    let persistence: CachePersistence =
        bincode::deserialize(&bytes).map_err(|e| StorageError::CorruptCache {
            path: path.to_path_buf(),
            reason: format!("Failed to deserialize build cache: {}", e),
        })?;

    if persistence.version != CACHE_VERSION {
        return Err(StorageError::CorruptCache {
            path: path.to_path_buf(),
            reason: format!(
                "Unsupported build cache version: {} (expected {})",
                persistence.version, CACHE_VERSION
            ),
        });
    }

    Ok(Some(persistence.records.into_iter().collect()))
}

/// Save records to disk atomically
pub fn save_to_disk(path: &Path, records: &BTreeMap<Stage, FingerprintRecord>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create parent directory {:?}: {}", parent, e),
            ))
        })?;
    }

    let persistence = CachePersistence {
        version: CACHE_VERSION,
        records: records
            .iter()
            .map(|(stage, record)| (*stage, record.clone()))
            .collect(),
    };

    let serialized = bincode::serialize(&persistence).map_err(|e| {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize build cache: {}", e),
        ))
    })?;

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, &serialized).map_err(|e| {
        StorageError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to write build cache to {:?}: {}", temp_path, e),
        ))
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to rename temp file to {:?}: {}", path, e),
        ))
    })?;

    Ok(())
}

/// `<path>.tmp`, keeping the original extension visible
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
