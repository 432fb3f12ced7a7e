//! Tracing initialization and configuration.

use std::path::PathBuf;
use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::sink::{LogSink, LogSinkGuard};

static INIT: Once = Once::new();

/// Where and how much to log.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// Filter used when `FAULTSCAN_LOG` is unset.
    pub filter: Option<String>,
    /// File every record is appended to, in addition to stderr.
    pub log_file: Option<PathBuf>,
}

/// Initialize the faultscan tracing/logging system.
///
/// Reads `FAULTSCAN_LOG` for per-target levels, e.g.
/// `FAULTSCAN_LOG=faultscan_pipeline=debug,faultscan_analysis=warn`.
/// Falls back to `settings.filter`, then `warn,faultscan=info`.
///
/// Idempotent: later calls return an inert guard.
pub fn init_tracing(settings: &LogSettings) -> LogSinkGuard {
    let mut guard = LogSinkGuard::inert();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("FAULTSCAN_LOG").unwrap_or_else(|_| {
            settings
                .filter
                .as_deref()
                .and_then(|f| EnvFilter::try_new(f).ok())
                .unwrap_or_else(|| EnvFilter::new("warn,faultscan=info"))
        });

        let sink = match LogSink::start(settings.log_file.as_deref()) {
            Ok(sink) => sink,
            Err(e) => {
                eprintln!("faultscan: cannot open log file, logging to stderr only: {e}");
                LogSink::start_with(Box::new(std::io::stderr()), None)
            }
        };

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(sink.make_writer())
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .init();

        guard = sink.into_guard();
    });
    guard
}
