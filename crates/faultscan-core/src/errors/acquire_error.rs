//! Repository acquisition errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("Fetch of {url} could not start: {message}")]
    Spawn { url: String, message: String },

    #[error("Fetch of {url} failed ({status}): {stderr}")]
    FetchFailed {
        url: String,
        status: String,
        stderr: String,
    },

    #[error("Fetch of {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("Could not clear destination {path}: {source}")]
    ClearDestination {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Giving up on {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },
}

impl ErrorCode for AcquireError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => error_code::ACQUIRE_TIMEOUT,
            _ => error_code::ACQUIRE_ERROR,
        }
    }
}
