//! Exit codes and configuration persistence of the `faultscan` binary.

use std::fs;
use std::process::Command;

fn faultscan() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_faultscan"));
    for (key, _) in std::env::vars() {
        if key.starts_with("FAULTSCAN_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

#[test]
fn missing_input_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let status = faultscan()
        .arg("--config")
        .arg(dir.path().join("faultscan.toml"))
        .arg("--input")
        .arg(dir.path().join("missing.csv"))
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .arg("--clone-dir")
        .arg(dir.path().join("clones"))
        .arg("--cache-file")
        .arg(dir.path().join("cache.jsonl"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn empty_input_runs_to_completion_and_persists_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("faultscan.toml");
    fs::write(dir.path().join("in.csv"), "repo_url\n").unwrap();

    let status = faultscan()
        .arg("--config")
        .arg(&config)
        .arg("--input")
        .arg(dir.path().join("in.csv"))
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .arg("--clone-dir")
        .arg(dir.path().join("clones"))
        .arg("--cache-file")
        .arg(dir.path().join("cache.jsonl"))
        .arg("--batch-size")
        .arg("7")
        .status()
        .unwrap();
    assert!(status.success());

    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "repo_url,Exception Type,Recommendation,Languages\n"
    );
    let persisted = fs::read_to_string(&config).unwrap();
    assert!(persisted.contains("batch_size = 7"));
    assert!(persisted.contains("retries = 3"));
}

#[test]
fn invalid_config_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("faultscan.toml");
    fs::write(&config, "[batch]\nbatch_size = 0\n").unwrap();
    let status = faultscan().arg("--config").arg(&config).status().unwrap();
    assert_eq!(status.code(), Some(1));
}
