//! Repository acquisition configuration.

use serde::{Deserialize, Serialize};

/// Retry and timeout policy for fetching repositories. Times are seconds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AcquireConfig {
    /// Attempts before giving up. Default: 3.
    pub retries: Option<u32>,
    /// Wait after the first failed attempt. Default: 5.
    pub initial_delay: Option<f64>,
    /// Multiplier applied per further attempt. Default: 2.
    pub backoff_factor: Option<f64>,
    /// Absolute bound on a single shallow fetch. Default: 300.
    pub fetch_timeout: Option<u64>,
    /// Entries in the in-process memo of successful fetches. Default: 128.
    pub memo_capacity: Option<u64>,
}

impl AcquireConfig {
    pub fn effective_retries(&self) -> u32 {
        self.retries.unwrap_or(3)
    }

    pub fn effective_initial_delay(&self) -> f64 {
        self.initial_delay.unwrap_or(5.0)
    }

    pub fn effective_backoff_factor(&self) -> f64 {
        self.backoff_factor.unwrap_or(2.0)
    }

    pub fn effective_fetch_timeout(&self) -> u64 {
        self.fetch_timeout.unwrap_or(300)
    }

    pub fn effective_memo_capacity(&self) -> u64 {
        self.memo_capacity.unwrap_or(128)
    }
}
