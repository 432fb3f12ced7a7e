//! Pipeline errors: everything that can stop one repository from
//! producing a result.

use super::error_code::{self, ErrorCode};
use super::{AcquireError, ClassifyError};

/// Aggregates subsystem errors via `From` conversions. Never propagated
/// past the pipeline boundary: the orchestrator turns it into a null result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Acquire error: {0}")]
    Acquire(#[from] AcquireError),

    #[error("Classify error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Unit for {url} panicked: {message}")]
    Panicked { url: String, message: String },
}

impl ErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Acquire(e) => e.error_code(),
            Self::Classify(e) => e.error_code(),
            Self::Panicked { .. } => error_code::UNIT_PANICKED,
        }
    }
}
