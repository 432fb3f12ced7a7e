//! Analyzer diagnostics.
//!
//! Capabilities never return these as errors: they travel as the diagnostic
//! payload next to a no-signal detection.

use crate::types::Language;

use super::error_code::{self, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("{language} source does not parse: {message}")]
    Syntax { language: Language, message: String },

    #[error("{language} analyzer unavailable: {reason}")]
    ToolUnavailable { language: Language, reason: String },

    #[error("{language} analyzer timed out after {timeout_ms}ms")]
    ToolTimeout { language: Language, timeout_ms: u64 },

    #[error("{language} analyzer exited with {status}: {stderr}")]
    ToolFailed {
        language: Language,
        status: String,
        stderr: String,
    },

    #[error("{language} analyzer emitted malformed output: {message}")]
    MalformedOutput { language: Language, message: String },

    #[error("{language} analyzer I/O failure: {message}")]
    Io { language: Language, message: String },
}

impl AnalyzerError {
    pub fn language(&self) -> Language {
        match self {
            Self::Syntax { language, .. }
            | Self::ToolUnavailable { language, .. }
            | Self::ToolTimeout { language, .. }
            | Self::ToolFailed { language, .. }
            | Self::MalformedOutput { language, .. }
            | Self::Io { language, .. } => *language,
        }
    }
}

impl ErrorCode for AnalyzerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => error_code::SYNTAX_ERROR,
            Self::ToolUnavailable { .. } => error_code::TOOL_UNAVAILABLE,
            Self::ToolTimeout { .. } => error_code::TOOL_TIMEOUT,
            Self::ToolFailed { .. } => error_code::TOOL_FAILED,
            Self::MalformedOutput { .. } => error_code::MALFORMED_OUTPUT,
            Self::Io { .. } => error_code::ANALYZER_IO,
        }
    }
}
