//! File classifier errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Conditions under which a working tree yields no repository verdict.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Repository tree at {root} is empty")]
    EmptyTree { root: PathBuf },

    #[error("Repository tree at {root} has no eligible source files ({entries} entries seen)")]
    NoEligibleFiles { root: PathBuf, entries: usize },

    #[error("Failed to walk {root}: {message}")]
    Walk { root: PathBuf, message: String },
}

impl ErrorCode for ClassifyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyTree { .. } => error_code::EMPTY_REPOSITORY,
            Self::NoEligibleFiles { .. } => error_code::NO_ELIGIBLE_FILES,
            Self::Walk { .. } => error_code::CLASSIFY_ERROR,
        }
    }
}
