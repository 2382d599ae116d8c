//! Error types for the CAM autogen pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors (build cache persistence and file copies)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Corrupt build cache at {path:?}: {reason}")]
    CorruptCache { path: PathBuf, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that abort the build.
///
/// Configuration errors are never retried. Generator failures leave the
/// build cache untouched so the next run regenerates.
#[derive(Debug, Error)]
pub enum AutogenError {
    #[error("Cannot find {tool} in {searched:?}")]
    ToolNotFound { tool: String, searched: Vec<PathBuf> },

    #[error("Unable to find {name} in {searched:?}")]
    FileNotFound { name: String, searched: Vec<PathBuf> },

    #[error("Unable to find SDF for suite '{0}'")]
    SuiteNotFound(String),

    #[error("No metadata file found for physics scheme '{0}'")]
    UnresolvedScheme(String),

    #[error("Missing required build value '{0}'")]
    MissingValue(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid suite definition {path:?}: {reason}")]
    InvalidSuite { path: PathBuf, reason: String },

    #[error("Invalid metadata file {path:?}: {reason}")]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error("Unable to generate CAM data structures from {file:?}, err = {code}")]
    RegistryFailed { file: PathBuf, code: i32 },

    #[error("Unable to generate CAM init source code, error message is:\n{0}")]
    InitWriterFailed(String),

    #[error("{tool} failed: {message}")]
    GeneratorFailed { tool: String, message: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for AutogenError {
    fn from(err: config::ConfigError) -> Self {
        AutogenError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AutogenError {
    fn from(err: std::io::Error) -> Self {
        AutogenError::StorageError(StorageError::IoError(err))
    }
}

impl AutogenError {
    /// True for errors caused by user configuration rather than a generator run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AutogenError::ToolNotFound { .. }
                | AutogenError::FileNotFound { .. }
                | AutogenError::SuiteNotFound(_)
                | AutogenError::UnresolvedScheme(_)
                | AutogenError::MissingValue(_)
                | AutogenError::ConfigError(_)
                | AutogenError::InvalidSuite { .. }
                | AutogenError::InvalidMetadata { .. }
        )
    }
}
