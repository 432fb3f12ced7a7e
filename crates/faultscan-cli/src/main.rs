//! `faultscan`: classify the fault-handling style of every repository in an
//! input table.
//!
//! Results are appended to the output table batch by batch and recorded in
//! a resumable cache, so an interrupted run picks up where it stopped.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use faultscan_cli::Driver;
use faultscan_core::config::{CliOverrides, FaultscanConfig};
use faultscan_core::errors::ErrorCode;
use faultscan_core::tracing::{init_tracing, install_panic_hook, LogSettings};

#[derive(Parser)]
#[command(name = "faultscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mine repositories for basic and advanced fault handling", long_about = None)]
struct Cli {
    /// Configuration file; created with resolved defaults if missing
    #[arg(short, long, env = "FAULTSCAN_CONFIG", default_value = "faultscan.toml")]
    config: PathBuf,

    /// Input table with a `repo_url` column
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output table (truncated at start)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Staging directory for working trees
    #[arg(long)]
    clone_dir: Option<PathBuf>,

    /// Resumable result cache
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Append log records to this file as well as stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Repositories per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Stop after this many batches
    #[arg(long)]
    max_batches: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            input: self.input.clone(),
            output: self.output.clone(),
            clone_dir: self.clone_dir.clone(),
            cache_file: self.cache_file.clone(),
            log_file: self.log_file.clone(),
            batch_size: self.batch_size,
            workers: self.workers,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match FaultscanConfig::load(&cli.config, Some(&cli.overrides())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("faultscan: {}", e.coded_string());
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing(&LogSettings {
        filter: config.log_filter.clone(),
        log_file: config.paths.log_file.clone(),
    });
    install_panic_hook();

    if let Err(e) = config.persist(&cli.config) {
        tracing::warn!(code = e.error_code(), "{e}");
    }

    match Driver::new(config).with_max_batches(cli.max_batches).run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            ExitCode::FAILURE
        }
    }
}
