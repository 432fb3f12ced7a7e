//! Error handling for faultscan.
//! One error enum per subsystem, `thiserror` only.

pub mod acquire_error;
pub mod analyzer_error;
pub mod classify_error;
pub mod config_error;
pub mod error_code;
pub mod pipeline_error;
pub mod process_error;
pub mod storage_error;

pub use acquire_error::AcquireError;
pub use analyzer_error::AnalyzerError;
pub use classify_error::ClassifyError;
pub use config_error::ConfigError;
pub use error_code::ErrorCode;
pub use pipeline_error::PipelineError;
pub use process_error::ProcessError;
pub use storage_error::StorageError;
