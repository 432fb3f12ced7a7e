//! Repository acquisition: shallow fetch with bounded retries, exponential
//! backoff, and an in-process memo of successful fetches.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use moka::sync::Cache;
use rand::Rng;

use faultscan_core::config::AcquireConfig;
use faultscan_core::errors::{AcquireError, ErrorCode, ProcessError};
use faultscan_core::process::run_with_timeout;

const STDERR_EXCERPT: usize = 512;

/// One fetch attempt. Implementations must not retry on their own.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path, timeout: Duration) -> Result<(), AcquireError>;
}

/// `git clone --depth 1`, run as a child process.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl GitFetcher {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a different git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self, url: &str, destination: &Path, timeout: Duration) -> Result<(), AcquireError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["clone", "--depth", "1", "--quiet", "--"])
            .arg(url)
            .arg(destination)
            .env("GIT_TERMINAL_PROMPT", "0");

        match run_with_timeout(&mut cmd, timeout) {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(AcquireError::FetchFailed {
                url: url.to_string(),
                status: output.status_label(),
                stderr: excerpt(&output.stderr),
            }),
            Err(ProcessError::TimedOut { .. }) => Err(AcquireError::Timeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
            Err(e) => Err(AcquireError::Spawn {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Attempt count, backoff curve and per-attempt timeout.
///
/// Delays are expressed in `time_unit`s: after failed attempt `i` (0-based)
/// the acquirer waits `initial_delay * backoff_factor^i + U[0,1) * backoff_factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_delay: f64,
    pub backoff_factor: f64,
    pub fetch_timeout: Duration,
    pub time_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AcquireConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AcquireConfig) -> Self {
        Self {
            retries: config.effective_retries(),
            initial_delay: config.effective_initial_delay(),
            backoff_factor: config.effective_backoff_factor(),
            fetch_timeout: Duration::from_secs(config.effective_fetch_timeout()),
            time_unit: Duration::from_secs(1),
        }
    }

    /// Scale every delay by `unit` instead of one second.
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    /// Wait after failed attempt `attempt`, in time units, before jitter.
    pub fn base_delay(&self, attempt: u32) -> f64 {
        self.initial_delay * self.backoff_factor.powi(attempt as i32)
    }

    /// `jitter` is a sample from `[0, 1)`.
    pub fn delay(&self, attempt: u32, jitter: f64) -> Duration {
        let units = self.base_delay(attempt) + jitter * self.backoff_factor;
        Duration::try_from_secs_f64(self.time_unit.as_secs_f64() * units).unwrap_or(Duration::MAX)
    }
}

/// What one `acquire` call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquireReport {
    pub attempts: u32,
    /// Waits actually slept, in order.
    pub waits: Vec<Duration>,
    /// Served from the memo without fetching.
    pub memoized: bool,
}

pub struct Acquirer {
    fetcher: Arc<dyn Fetcher>,
    policy: RetryPolicy,
    memo: Cache<(String, PathBuf), ()>,
}

impl Acquirer {
    pub fn new(fetcher: Arc<dyn Fetcher>, policy: RetryPolicy, memo_capacity: u64) -> Self {
        Self {
            fetcher,
            policy,
            memo: Cache::new(memo_capacity),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `url` into `destination`, retrying with backoff.
    ///
    /// The destination is cleared before every attempt. A memoized success
    /// only counts while the destination still has contents.
    pub fn acquire(&self, url: &str, destination: &Path) -> Result<AcquireReport, AcquireError> {
        let key = (url.to_string(), destination.to_path_buf());
        if self.memo.contains_key(&key) {
            if is_populated(destination) {
                tracing::debug!(url, path = %destination.display(), "fetch served from memo");
                return Ok(AcquireReport {
                    memoized: true,
                    ..AcquireReport::default()
                });
            }
            self.memo.invalidate(&key);
        }

        let mut report = AcquireReport::default();
        let mut rng = rand::thread_rng();
        for attempt in 0..self.policy.retries {
            clear_destination(destination)?;
            report.attempts += 1;

            match self.fetcher.fetch(url, destination, self.policy.fetch_timeout) {
                Ok(()) => {
                    self.memo.insert(key, ());
                    tracing::info!(url, attempt = report.attempts, "repository fetched");
                    return Ok(report);
                }
                Err(e) => {
                    tracing::warn!(
                        url,
                        attempt = report.attempts,
                        retries = self.policy.retries,
                        code = e.error_code(),
                        "fetch attempt failed: {e}"
                    );
                    if attempt + 1 < self.policy.retries {
                        let wait = self.policy.delay(attempt, rng.gen::<f64>());
                        report.waits.push(wait);
                        thread::sleep(wait);
                    }
                }
            }
        }

        Err(AcquireError::Exhausted {
            url: url.to_string(),
            attempts: report.attempts,
        })
    }
}

fn is_populated(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Remove whatever is at `path`, directory or file.
pub(crate) fn clear_destination(path: &Path) -> Result<(), AcquireError> {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(AcquireError::ClearDestination {
            path: path.to_path_buf(),
            source,
        }),
    }
}
