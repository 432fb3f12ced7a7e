//! Retry, backoff and memo behaviour against a scripted fetcher.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use faultscan_core::errors::AcquireError;
use faultscan_pipeline::{Acquirer, Fetcher, RetryPolicy};

/// Fails or succeeds according to a script; success writes one file.
struct ScriptedFetcher {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicU32,
    saw_leftovers: AtomicU32,
}

impl ScriptedFetcher {
    fn new(script: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.iter().copied().collect()),
            calls: AtomicU32::new(0),
            saw_leftovers: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str, destination: &Path, _timeout: Duration) -> Result<(), AcquireError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if destination.exists() {
            self.saw_leftovers.fetch_add(1, Ordering::SeqCst);
        }
        // Every attempt leaves something behind, like a half-finished clone.
        fs::create_dir_all(destination).unwrap();
        fs::write(destination.join("partial.py"), "x = 1\n").unwrap();

        let ok = self.script.lock().unwrap().pop_front().unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(AcquireError::FetchFailed {
                url: url.to_string(),
                status: "exit code 128".to_string(),
                stderr: "connection reset".to_string(),
            })
        }
    }
}

fn fast_policy(retries: u32) -> RetryPolicy {
    RetryPolicy {
        retries,
        initial_delay: 5.0,
        backoff_factor: 2.0,
        fetch_timeout: Duration::from_secs(300),
        time_unit: Duration::from_millis(1),
    }
}

#[test]
fn two_failures_then_success_takes_three_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("repo");
    let fetcher = ScriptedFetcher::new(&[false, false, true]);
    let acquirer = Acquirer::new(fetcher.clone(), fast_policy(3), 16);

    let report = acquirer.acquire("https://h/o/repo", &dest).unwrap();
    assert_eq!(report.attempts, 3);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(report.waits.len(), 2);
    assert!(report.waits[0] < report.waits[1], "waits must grow: {:?}", report.waits);
    assert!(report.waits[0] >= Duration::from_millis(5));
    assert!(report.waits[1] >= Duration::from_millis(10));
    assert!(!report.memoized);
}

#[test]
fn destination_is_cleared_before_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("repo");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("stale.txt"), "old").unwrap();

    let fetcher = ScriptedFetcher::new(&[false, false, true]);
    let acquirer = Acquirer::new(fetcher.clone(), fast_policy(3), 16);
    acquirer.acquire("https://h/o/repo", &dest).unwrap();
    assert_eq!(fetcher.saw_leftovers.load(Ordering::SeqCst), 0);
    assert!(!dest.join("stale.txt").exists());
}

#[test]
fn exhaustion_is_a_reported_failure() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(&[]);
    let acquirer = Acquirer::new(fetcher.clone(), fast_policy(3), 16);

    let err = acquirer.acquire("https://h/o/gone", &dir.path().join("gone")).unwrap_err();
    assert!(matches!(err, AcquireError::Exhausted { attempts: 3, .. }));
    assert_eq!(fetcher.calls(), 3);
}

#[test]
fn memo_is_honoured_only_while_destination_is_populated() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("repo");
    let fetcher = ScriptedFetcher::new(&[true, true]);
    let acquirer = Acquirer::new(fetcher.clone(), fast_policy(3), 16);

    acquirer.acquire("https://h/o/repo", &dest).unwrap();
    let again = acquirer.acquire("https://h/o/repo", &dest).unwrap();
    assert!(again.memoized);
    assert_eq!(fetcher.calls(), 1);

    fs::remove_dir_all(&dest).unwrap();
    let refetched = acquirer.acquire("https://h/o/repo", &dest).unwrap();
    assert!(!refetched.memoized);
    assert_eq!(fetcher.calls(), 2);
}
