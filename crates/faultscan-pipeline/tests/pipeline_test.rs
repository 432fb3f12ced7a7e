//! Pipeline terminal states and the working-tree cleanup invariant.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use faultscan_analysis::capabilities::{Capability, CapabilityOutput, PythonCapability};
use faultscan_analysis::{CapabilityRegistry, ClassifierSettings, FileClassifier};
use faultscan_core::errors::{AcquireError, ClassifyError, PipelineError};
use faultscan_core::{Language, RepositoryRef, Verdict};
use faultscan_pipeline::{Acquirer, Fetcher, PipelineState, RepositoryPipeline, RetryPolicy};

/// Materializes a fixed set of files, or fails.
struct TreeFetcher {
    files: Vec<(&'static str, &'static str)>,
    fail: bool,
}

impl Fetcher for TreeFetcher {
    fn fetch(&self, url: &str, destination: &Path, _timeout: Duration) -> Result<(), AcquireError> {
        if self.fail {
            return Err(AcquireError::Spawn {
                url: url.to_string(),
                message: "offline".to_string(),
            });
        }
        fs::create_dir_all(destination.join(".git")).unwrap();
        for (rel, body) in &self.files {
            let path = destination.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        Ok(())
    }
}

struct PanickingGo;

impl Capability for PanickingGo {
    fn language(&self) -> Language {
        Language::Go
    }

    fn analyze(&self, _source: &str) -> CapabilityOutput {
        panic!("analyzer bug");
    }
}

fn pipeline(staging: &Path, fetcher: TreeFetcher) -> RepositoryPipeline {
    let policy = RetryPolicy {
        retries: 2,
        initial_delay: 1.0,
        backoff_factor: 1.0,
        fetch_timeout: Duration::from_secs(5),
        time_unit: Duration::from_millis(1),
    };
    let acquirer = Arc::new(Acquirer::new(Arc::new(fetcher), policy, 8));
    let registry = CapabilityRegistry::new()
        .with(PythonCapability::new())
        .with(PanickingGo);
    let classifier = Arc::new(FileClassifier::new(Arc::new(registry), ClassifierSettings::default()));
    RepositoryPipeline::new(acquirer, classifier, staging)
}

fn tree_path(staging: &Path, repo: &RepositoryRef) -> std::path::PathBuf {
    staging.join(repo.local_name())
}

#[test]
fn success_yields_one_result_and_removes_tree() {
    let staging = tempfile::tempdir().unwrap();
    let repo = RepositoryRef::new("https://h/o/good");
    let p = pipeline(
        staging.path(),
        TreeFetcher {
            files: vec![("svc/app.py", "try:\n    go()\nexcept Exception:\n    pass\n")],
            fail: false,
        },
    );

    let outcome = p.run(&repo);
    assert_eq!(outcome.state, PipelineState::Done);
    assert!(!tree_path(staging.path(), &repo).exists());
    let result = outcome.into_result().unwrap();
    assert_eq!(result.url(), "https://h/o/good");
    assert_eq!(result.verdict(), Verdict::Basic);
    assert_eq!(result.languages(), &[Language::Python]);
}

#[test]
fn acquire_failure_is_terminal_and_clean() {
    let staging = tempfile::tempdir().unwrap();
    let repo = RepositoryRef::new("https://h/o/offline");
    let p = pipeline(staging.path(), TreeFetcher { files: vec![], fail: true });

    let outcome = p.run(&repo);
    assert_eq!(outcome.state, PipelineState::AcquireFailed);
    assert!(matches!(outcome.result, Err(PipelineError::Acquire(AcquireError::Exhausted { .. }))));
    assert!(!tree_path(staging.path(), &repo).exists());
}

#[test]
fn empty_repository_is_classify_failure_and_clean() {
    let staging = tempfile::tempdir().unwrap();
    let repo = RepositoryRef::new("https://h/o/empty");
    let p = pipeline(staging.path(), TreeFetcher { files: vec![], fail: false });

    let outcome = p.run(&repo);
    assert_eq!(outcome.state, PipelineState::ClassifyFailed);
    assert!(matches!(outcome.result, Err(PipelineError::Classify(ClassifyError::EmptyTree { .. }))));
    assert!(!tree_path(staging.path(), &repo).exists());
}

#[test]
fn unwinding_unit_still_removes_tree() {
    let staging = tempfile::tempdir().unwrap();
    let repo = RepositoryRef::new("https://h/o/buggy");
    let p = pipeline(
        staging.path(),
        TreeFetcher {
            files: vec![("main.go", "package main")],
            fail: false,
        },
    );

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| p.run(&repo)));
    assert!(unwound.is_err());
    assert!(!tree_path(staging.path(), &repo).exists());
}
