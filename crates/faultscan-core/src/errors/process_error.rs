//! Child-process errors raised by the timeout-bounded runner.

use std::time::Duration;

use super::error_code::{self, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} did not finish within {after:?}")]
    TimedOut { program: String, after: Duration },

    #[error("failed waiting on {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

impl ProcessError {
    /// True when the program itself could not be found or executed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl ErrorCode for ProcessError {
    fn error_code(&self) -> &'static str {
        error_code::PROCESS_ERROR
    }
}
