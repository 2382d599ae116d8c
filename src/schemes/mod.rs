//! Physics scheme discovery
//!
//! Indexes scheme metadata files found under the physics source directories and
//! pairs each with its Fortran source. Directory order is authoritative: the first
//! directory that provides a metadata file name (or a scheme name) wins.

pub mod metadata;
pub mod suite;

pub use metadata::{CcppMetadataFinder, SchemeNameFinder};
pub use suite::{find_schemes_in_suite, SuiteNode, SuiteReader, XmlSuiteReader};

use crate::error::{AutogenError, StorageError};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Metadata file extension
pub const METADATA_EXTENSION: &str = "meta";

/// Fortran source extensions, in lookup order
pub const FORTRAN_EXTENSIONS: [&str; 4] = ["F90", "F", "f", "f90"];

/// Directory names never scanned
const EXCLUDED_DIRS: &[&str] = &[".git"];

/// Where a scheme is declared and implemented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeEntry {
    pub metadata: PathBuf,
    pub source: PathBuf,
}

/// Find the Fortran source next to a metadata file.
///
/// Logs a warning and returns `None` when no source exists.
pub fn find_scheme_source(metadata_path: &Path) -> Option<PathBuf> {
    let source = FORTRAN_EXTENSIONS
        .iter()
        .map(|ext| metadata_path.with_extension(ext))
        .find(|candidate| candidate.exists());
    if source.is_none() {
        warn!(metadata = %metadata_path.display(), "No Fortran for metadata file");
    }
    source
}

/// Scheme name → metadata and source file
#[derive(Debug, Clone, Default)]
pub struct SchemeIndex {
    entries: HashMap<String, SchemeEntry>,
}

impl SchemeIndex {
    /// Scan `source_dirs` in order for metadata files.
    ///
    /// Missing directories are skipped. Within a directory, entries are visited in
    /// file-name order so the index is deterministic.
    pub fn build<P: AsRef<Path>>(
        source_dirs: &[P],
        finder: &dyn SchemeNameFinder,
    ) -> Result<Self, AutogenError> {
        let mut entries: HashMap<String, SchemeEntry> = HashMap::new();
        let mut seen_files: HashSet<OsString> = HashSet::new();

        for dir in source_dirs {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "Skipping missing scheme source directory");
                continue;
            }

            let walker = WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_excluded(e));

            for entry in walker {
                let entry = entry.map_err(|e| {
                    StorageError::IoError(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to walk directory {:?}: {}", dir, e),
                    ))
                })?;

                let path = entry.path();
                if !entry.file_type().is_file() || !is_metadata(path) {
                    continue;
                }

                let file_name = entry.file_name().to_os_string();
                if seen_files.contains(&file_name) {
                    debug!(metadata = %path.display(), "Shadowed by earlier metadata file");
                    continue;
                }
                seen_files.insert(file_name);

                let Some(source) = find_scheme_source(path) else {
                    continue;
                };

                for scheme in finder.find_scheme_names(path)? {
                    entries.entry(scheme).or_insert_with(|| SchemeEntry {
                        metadata: path.to_path_buf(),
                        source: source.clone(),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, scheme: &str) -> Option<&SchemeEntry> {
        self.entries.get(scheme)
    }

    /// Resolve a scheme; unknown schemes are a configuration error
    pub fn resolve(&self, scheme: &str) -> Result<&SchemeEntry, AutogenError> {
        self.get(scheme)
            .ok_or_else(|| AutogenError::UnresolvedScheme(scheme.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && EXCLUDED_DIRS
            .iter()
            .any(|name| entry.file_name() == std::ffi::OsStr::new(name))
}

fn is_metadata(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == METADATA_EXTENSION)
        .unwrap_or(false)
}
