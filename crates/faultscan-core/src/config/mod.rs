//! Configuration system for faultscan.
//! TOML-based, layered resolution: CLI > env > config file > defaults.

pub mod acquire_config;
pub mod analyzers_config;
pub mod batch_config;
pub mod faultscan_config;
pub mod paths_config;
pub mod scan_config;

pub use acquire_config::AcquireConfig;
pub use analyzers_config::{AnalyzersConfig, ToolConfig, ToolOutputFormat};
pub use batch_config::BatchConfig;
pub use faultscan_config::{CliOverrides, FaultscanConfig};
pub use paths_config::PathsConfig;
pub use scan_config::ScanConfig;
