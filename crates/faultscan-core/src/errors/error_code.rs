//! ErrorCode trait: a stable machine code attached to every diagnostic.

/// Every error enum implements this so log records carry a `code` field
/// that can be grepped and counted independently of the message text.
pub trait ErrorCode {
    /// Returns the error code string (e.g., "TOOL_TIMEOUT").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SYNTAX_ERROR: &str = "SYNTAX_ERROR";
pub const TOOL_UNAVAILABLE: &str = "TOOL_UNAVAILABLE";
pub const TOOL_TIMEOUT: &str = "TOOL_TIMEOUT";
pub const TOOL_FAILED: &str = "TOOL_FAILED";
pub const MALFORMED_OUTPUT: &str = "MALFORMED_OUTPUT";
pub const ANALYZER_IO: &str = "ANALYZER_IO";
pub const EMPTY_REPOSITORY: &str = "EMPTY_REPOSITORY";
pub const NO_ELIGIBLE_FILES: &str = "NO_ELIGIBLE_FILES";
pub const CLASSIFY_ERROR: &str = "CLASSIFY_ERROR";
pub const ACQUIRE_ERROR: &str = "ACQUIRE_ERROR";
pub const ACQUIRE_TIMEOUT: &str = "ACQUIRE_TIMEOUT";
pub const PROCESS_ERROR: &str = "PROCESS_ERROR";
pub const INPUT_ERROR: &str = "INPUT_ERROR";
pub const OUTPUT_ERROR: &str = "OUTPUT_ERROR";
pub const CACHE_ERROR: &str = "CACHE_ERROR";
pub const UNIT_PANICKED: &str = "UNIT_PANICKED";
