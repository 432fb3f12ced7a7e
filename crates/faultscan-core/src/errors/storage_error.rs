//! Persistence layer errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Input table {path} unreadable: {message}")]
    InputUnreadable { path: PathBuf, message: String },

    #[error("Input table {path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Output table {path} could not be initialized: {message}")]
    OutputInit { path: PathBuf, message: String },

    #[error("Append to output table {path} failed: {message}")]
    OutputWrite { path: PathBuf, message: String },

    #[error("Cache write to {path} failed: {message}")]
    CacheWrite { path: PathBuf, message: String },
}

impl StorageError {
    /// Fatal-setup errors abort the process; the rest are logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InputUnreadable { .. } | Self::MissingColumn { .. } | Self::OutputInit { .. }
        )
    }
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InputUnreadable { .. } | Self::MissingColumn { .. } => error_code::INPUT_ERROR,
            Self::OutputInit { .. } | Self::OutputWrite { .. } => error_code::OUTPUT_ERROR,
            Self::CacheWrite { .. } => error_code::CACHE_ERROR,
        }
    }
}
