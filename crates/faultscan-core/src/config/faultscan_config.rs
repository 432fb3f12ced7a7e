//! Top-level faultscan configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AcquireConfig, AnalyzersConfig, BatchConfig, PathsConfig, ScanConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`FAULTSCAN_*`)
/// 3. Config file (`faultscan.toml` unless told otherwise)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FaultscanConfig {
    pub paths: PathsConfig,
    pub acquire: AcquireConfig,
    pub batch: BatchConfig,
    pub scan: ScanConfig,
    pub analyzers: AnalyzersConfig,
    /// Log filter used when `FAULTSCAN_LOG` is unset, e.g. `faultscan=debug`.
    pub log_filter: Option<String>,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub clone_dir: Option<PathBuf>,
    pub cache_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub workers: Option<usize>,
}

impl FaultscanConfig {
    /// Load configuration: defaults, then `path` if it exists, then
    /// environment, then CLI overrides. The result is validated.
    pub fn load(path: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            Self::default()
        };

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &FaultscanConfig) -> Result<(), ConfigError> {
        fn invalid(field: &str, message: &str) -> ConfigError {
            ConfigError::ValidationFailed {
                field: field.to_string(),
                message: message.to_string(),
            }
        }

        if config.acquire.retries == Some(0) {
            return Err(invalid("acquire.retries", "must be at least 1"));
        }
        if let Some(delay) = config.acquire.initial_delay {
            if !delay.is_finite() || delay < 0.0 {
                return Err(invalid("acquire.initial_delay", "must be a non-negative number"));
            }
        }
        if let Some(factor) = config.acquire.backoff_factor {
            if !factor.is_finite() || factor < 1.0 {
                return Err(invalid("acquire.backoff_factor", "must be at least 1.0"));
            }
        }
        if config.acquire.fetch_timeout == Some(0) {
            return Err(invalid("acquire.fetch_timeout", "must be greater than 0"));
        }
        if config.batch.batch_size == Some(0) {
            return Err(invalid("batch.batch_size", "must be greater than 0"));
        }
        if config.batch.workers == Some(0) {
            return Err(invalid("batch.workers", "must be greater than 0"));
        }
        if config.batch.cache_flush_size == Some(0) {
            return Err(invalid("batch.cache_flush_size", "must be greater than 0"));
        }
        if config.scan.max_file_size == Some(0) {
            return Err(invalid("scan.max_file_size", "must be greater than 0"));
        }
        if config.analyzers.tool_timeout == Some(0) {
            return Err(invalid("analyzers.tool_timeout", "must be greater than 0"));
        }
        for (tag, tool) in &config.analyzers.tools {
            if tool.program.trim().is_empty() {
                return Err(invalid(&format!("analyzers.tools.{tag}.program"), "must not be empty"));
            }
            if tool.timeout == Some(0) {
                return Err(invalid(&format!("analyzers.tools.{tag}.timeout"), "must be greater than 0"));
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    /// Pattern: `FAULTSCAN_INPUT`, `FAULTSCAN_BATCH_SIZE`, etc.
    fn apply_env_overrides(config: &mut FaultscanConfig) {
        if let Some(val) = std::env::var_os("FAULTSCAN_INPUT") {
            config.paths.input = Some(PathBuf::from(val));
        }
        if let Some(val) = std::env::var_os("FAULTSCAN_OUTPUT") {
            config.paths.output = Some(PathBuf::from(val));
        }
        if let Some(val) = std::env::var_os("FAULTSCAN_CLONE_DIR") {
            config.paths.clone_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = std::env::var_os("FAULTSCAN_CACHE_FILE") {
            config.paths.cache_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("FAULTSCAN_BATCH_SIZE") {
            if let Ok(v) = val.parse::<usize>() {
                config.batch.batch_size = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FAULTSCAN_WORKERS") {
            if let Ok(v) = val.parse::<usize>() {
                config.batch.workers = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut FaultscanConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.input {
            config.paths.input = Some(v.clone());
        }
        if let Some(ref v) = cli.output {
            config.paths.output = Some(v.clone());
        }
        if let Some(ref v) = cli.clone_dir {
            config.paths.clone_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.cache_file {
            config.paths.cache_file = Some(v.clone());
        }
        if let Some(ref v) = cli.log_file {
            config.paths.log_file = Some(v.clone());
        }
        if let Some(v) = cli.batch_size {
            config.batch.batch_size = Some(v);
        }
        if let Some(v) = cli.workers {
            config.batch.workers = Some(v);
        }
    }

    /// A copy with every defaulted option written out, so the persisted file
    /// records exactly what a run used. Worker count stays machine-dependent
    /// unless it was set explicitly.
    pub fn resolved(&self) -> FaultscanConfig {
        let mut out = self.clone();
        out.paths.input = Some(self.paths.effective_input().to_path_buf());
        out.paths.output = Some(self.paths.effective_output().to_path_buf());
        out.paths.clone_dir = Some(self.paths.effective_clone_dir().to_path_buf());
        out.paths.cache_file = Some(self.paths.effective_cache_file().to_path_buf());
        out.acquire.retries = Some(self.acquire.effective_retries());
        out.acquire.initial_delay = Some(self.acquire.effective_initial_delay());
        out.acquire.backoff_factor = Some(self.acquire.effective_backoff_factor());
        out.acquire.fetch_timeout = Some(self.acquire.effective_fetch_timeout());
        out.acquire.memo_capacity = Some(self.acquire.effective_memo_capacity());
        out.batch.batch_size = Some(self.batch.effective_batch_size());
        out.batch.cache_flush_size = Some(self.batch.effective_cache_flush_size());
        out.scan.max_file_size = Some(self.scan.effective_max_file_size());
        out.scan.skip_binary = Some(self.scan.effective_skip_binary());
        out.analyzers.tool_timeout = Some(self.analyzers.effective_tool_timeout());
        out.analyzers.tools = self.analyzers.effective_tools();
        out
    }

    /// Write the resolved configuration to `path`.
    pub fn persist(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.resolved().to_toml()?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}
