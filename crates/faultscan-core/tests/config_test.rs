//! Tests for the faultscan configuration system.

use std::sync::Mutex;

use faultscan_core::config::{CliOverrides, FaultscanConfig, ToolOutputFormat};
use faultscan_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all FAULTSCAN_ env vars to prevent cross-test contamination.
fn clear_env_vars() {
    for key in [
        "FAULTSCAN_INPUT",
        "FAULTSCAN_OUTPUT",
        "FAULTSCAN_CLONE_DIR",
        "FAULTSCAN_CACHE_FILE",
        "FAULTSCAN_BATCH_SIZE",
        "FAULTSCAN_WORKERS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_match_documented_values() {
    let config = FaultscanConfig::default();
    assert_eq!(config.paths.effective_input().to_str(), Some("input.csv"));
    assert_eq!(config.paths.effective_clone_dir().to_str(), Some("cloned_repos"));
    assert_eq!(config.acquire.effective_retries(), 3);
    assert_eq!(config.acquire.effective_initial_delay(), 5.0);
    assert_eq!(config.acquire.effective_backoff_factor(), 2.0);
    assert_eq!(config.acquire.effective_fetch_timeout(), 300);
    assert_eq!(config.batch.effective_batch_size(), 50);
    assert_eq!(config.batch.effective_cache_flush_size(), 1000);
    assert!(config.batch.effective_workers() >= 1);
    assert_eq!(config.analyzers.effective_tool_timeout(), 30);
}

#[test]
fn layered_resolution_cli_over_env_over_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("faultscan.toml");
    std::fs::write(
        &path,
        r#"
[paths]
input = "from_file.csv"
output = "file_out.csv"

[batch]
batch_size = 10
workers = 2
"#,
    )
    .unwrap();

    std::env::set_var("FAULTSCAN_BATCH_SIZE", "20");
    std::env::set_var("FAULTSCAN_OUTPUT", "env_out.csv");

    let cli = CliOverrides {
        batch_size: Some(30),
        ..Default::default()
    };
    let config = FaultscanConfig::load(&path, Some(&cli)).unwrap();
    clear_env_vars();

    assert_eq!(config.paths.effective_input().to_str(), Some("from_file.csv"));
    assert_eq!(config.paths.effective_output().to_str(), Some("env_out.csv"));
    assert_eq!(config.batch.effective_batch_size(), 30);
    assert_eq!(config.batch.effective_workers(), 2);
}

#[test]
fn missing_file_yields_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let config = FaultscanConfig::load(&dir.path().join("absent.toml"), None).unwrap();
    assert_eq!(config.batch.effective_batch_size(), 50);
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = FaultscanConfig::from_toml("[batch\nbatch_size = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn validation_rejects_degenerate_values() {
    for toml in [
        "[batch]\nbatch_size = 0",
        "[acquire]\nretries = 0",
        "[acquire]\nbackoff_factor = 0.5",
        "[analyzers]\ntool_timeout = 0",
    ] {
        let config = FaultscanConfig::from_toml(toml).unwrap();
        let err = FaultscanConfig::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { .. }), "{toml}");
    }
}

#[test]
fn configured_tools_override_builtin_table() {
    let config = FaultscanConfig::from_toml(
        r#"
[analyzers.tools.go]
program = "/opt/bin/goscan"
output = "json_flags"
timeout = 5
"#,
    )
    .unwrap();
    let tools = config.analyzers.effective_tools();
    let go = &tools["go"];
    assert_eq!(go.program, "/opt/bin/goscan");
    assert_eq!(go.output, ToolOutputFormat::JsonFlags);
    assert_eq!(go.timeout, Some(5));
    assert_eq!(tools["swift"].output, ToolOutputFormat::SwiftStructure);
}

#[test]
fn persisted_config_round_trips_with_defaults_filled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("faultscan.toml");

    let config = FaultscanConfig::from_toml("[paths]\ninput = \"repos.csv\"").unwrap();
    config.persist(&path).unwrap();

    let reloaded = FaultscanConfig::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reloaded.paths.input.as_deref().and_then(|p| p.to_str()), Some("repos.csv"));
    assert_eq!(reloaded.paths.cache_file.as_deref().and_then(|p| p.to_str()), Some("analysis_cache.jsonl"));
    assert_eq!(reloaded.acquire.retries, Some(3));
    assert_eq!(reloaded.batch.batch_size, Some(50));
    assert!(reloaded.analyzers.tools.contains_key("ruby"));
}
