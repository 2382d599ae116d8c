//! First-match file lookup and copy-if-different.

use crate::cache::hasher;
use crate::error::{AutogenError, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A located file and the search directory it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub file: PathBuf,
    pub dir: PathBuf,
}

/// Find `file_name` in `search_dirs`, returning the first match in list order
pub fn find_file<P: AsRef<Path>>(file_name: &str, search_dirs: &[P]) -> Option<Located> {
    search_dirs.iter().find_map(|dir| {
        let dir = dir.as_ref();
        let candidate = dir.join(file_name);
        candidate.exists().then(|| Located {
            file: candidate,
            dir: dir.to_path_buf(),
        })
    })
}

/// Resolves generator tools and their data files by name
pub trait ToolLocator {
    fn locate(&self, file_name: &str) -> Option<Located>;

    /// Directories searched, for error messages
    fn search_dirs(&self) -> Vec<PathBuf>;

    /// Locate a generator tool; a miss is a configuration error
    fn require_tool(&self, tool: &str) -> Result<Located, AutogenError> {
        self.locate(tool).ok_or_else(|| AutogenError::ToolNotFound {
            tool: tool.to_string(),
            searched: self.search_dirs(),
        })
    }

    /// Locate a data file; a miss is a configuration error
    fn require_file(&self, name: &str) -> Result<Located, AutogenError> {
        self.locate(name).ok_or_else(|| AutogenError::FileNotFound {
            name: name.to_string(),
            searched: self.search_dirs(),
        })
    }
}

/// Locator over an ordered list of directories
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    dirs: Vec<PathBuf>,
}

impl SearchPathLocator {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl ToolLocator for SearchPathLocator {
    fn locate(&self, file_name: &str) -> Option<Located> {
        let found = find_file(file_name, &self.dirs);
        if let Some(ref located) = found {
            debug!(file = file_name, dir = %located.dir.display(), "Located");
        }
        found
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        self.dirs.clone()
    }
}

/// Whether `update_file` touched the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Replaced,
    Unchanged,
}

/// Copy `source` into `dest_dir` under its own file name.
///
/// An identical file already in `dest_dir` is left alone; a different one is
/// replaced.
pub fn update_file(source: &Path, dest_dir: &Path) -> Result<CopyOutcome, StorageError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(source.display().to_string()))?;
    let dest = dest_dir.join(file_name);

    let outcome = if dest.exists() {
        if hasher::same_content(source, &dest) {
            return Ok(CopyOutcome::Unchanged);
        }
        fs::remove_file(&dest)?;
        CopyOutcome::Replaced
    } else {
        CopyOutcome::Copied
    };

    fs::copy(source, &dest)?;
    debug!(source = %source.display(), dest = %dest.display(), ?outcome, "Updated build file");
    Ok(outcome)
}
