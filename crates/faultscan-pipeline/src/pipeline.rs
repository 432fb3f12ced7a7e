//! Per-repository pipeline: acquire, classify, always dispose the tree.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use faultscan_analysis::FileClassifier;
use faultscan_core::errors::{ErrorCode, PipelineError};
use faultscan_core::{RepositoryRef, RepositoryResult};

use crate::acquire::Acquirer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Acquiring,
    AcquireFailed,
    Classifying,
    ClassifyFailed,
    Done,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AcquireFailed | Self::ClassifyFailed | Self::Done)
    }

    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Pending, Acquiring)
                | (Acquiring, AcquireFailed)
                | (Acquiring, Classifying)
                | (Classifying, ClassifyFailed)
                | (Classifying, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Exclusive handle on one repository's local copy. Dropping it deletes
/// the directory; failures are logged and swallowed.
#[derive(Debug)]
pub struct WorkingTree {
    path: PathBuf,
}

impl WorkingTree {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingTree {
    fn drop(&mut self) {
        let removed = match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&self.path),
            Ok(_) => fs::remove_file(&self.path),
            Err(e) => Err(e),
        };
        match removed {
            Ok(()) => tracing::trace!(path = %self.path.display(), "working tree removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "working tree removal failed"),
        }
    }
}

/// Terminal state plus either the result or the reason there is none.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub url: String,
    pub state: PipelineState,
    pub result: Result<RepositoryResult, PipelineError>,
    pub elapsed: Duration,
}

impl PipelineOutcome {
    pub fn into_result(self) -> Option<RepositoryResult> {
        self.result.ok()
    }
}

pub struct RepositoryPipeline {
    acquirer: Arc<Acquirer>,
    classifier: Arc<FileClassifier>,
    staging_dir: PathBuf,
}

impl RepositoryPipeline {
    pub fn new(acquirer: Arc<Acquirer>, classifier: Arc<FileClassifier>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            acquirer,
            classifier,
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Run one repository to a terminal state. The working tree is gone by
    /// the time this returns, and also if it unwinds.
    pub fn run(&self, repo: &RepositoryRef) -> PipelineOutcome {
        let start = Instant::now();
        let mut state = PipelineState::Pending;
        let tree = WorkingTree::new(self.staging_dir.join(repo.local_name()));

        let result = self.drive(repo, &tree, &mut state);
        drop(tree);

        let elapsed = start.elapsed();
        match &result {
            Ok(r) => tracing::info!(
                url = repo.url(),
                verdict = %r.verdict(),
                languages = %r.languages_joined(),
                elapsed_ms = elapsed.as_millis() as u64,
                "repository classified"
            ),
            Err(e) => tracing::warn!(
                url = repo.url(),
                state = %state,
                code = e.error_code(),
                "repository skipped: {e}"
            ),
        }

        PipelineOutcome {
            url: repo.url().to_string(),
            state,
            result,
            elapsed,
        }
    }

    fn drive(
        &self,
        repo: &RepositoryRef,
        tree: &WorkingTree,
        state: &mut PipelineState,
    ) -> Result<RepositoryResult, PipelineError> {
        advance(state, PipelineState::Acquiring, repo);
        if let Err(e) = self.acquirer.acquire(repo.url(), tree.path()) {
            advance(state, PipelineState::AcquireFailed, repo);
            return Err(e.into());
        }

        advance(state, PipelineState::Classifying, repo);
        let classification = match self.classifier.classify(tree.path()) {
            Ok(c) => c,
            Err(e) => {
                advance(state, PipelineState::ClassifyFailed, repo);
                return Err(e.into());
            }
        };

        let stats = &classification.stats;
        tracing::debug!(
            url = repo.url(),
            analyzed = stats.files_analyzed,
            skipped = stats.files_skipped(),
            skipped_undecodable = stats.skipped_undecodable,
            skipped_no_capability = stats.skipped_no_capability,
            diagnostics = stats.diagnostics,
            "classification stats"
        );

        advance(state, PipelineState::Done, repo);
        Ok(RepositoryResult::new(
            repo.url(),
            classification.verdict,
            classification.languages,
        ))
    }
}

fn advance(state: &mut PipelineState, next: PipelineState, repo: &RepositoryRef) {
    debug_assert!(state.can_advance_to(next), "illegal transition {state} -> {next}");
    tracing::trace!(url = repo.url(), from = %state, to = %next, "pipeline transition");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        use PipelineState::*;
        assert!(Pending.can_advance_to(Acquiring));
        assert!(Acquiring.can_advance_to(AcquireFailed));
        assert!(Classifying.can_advance_to(Done));
        assert!(!Pending.can_advance_to(Done));
        assert!(!Done.can_advance_to(Acquiring));
        assert!(!AcquireFailed.can_advance_to(Classifying));
        assert!(Done.is_terminal() && ClassifyFailed.is_terminal());
        assert!(!Classifying.is_terminal());
    }

    #[test]
    fn working_tree_drop_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo-1");
        fs::create_dir_all(path.join("a/b")).unwrap();
        fs::write(path.join("a/b/c.py"), "x").unwrap();
        drop(WorkingTree::new(path.clone()));
        assert!(!path.exists());
        drop(WorkingTree::new(path.clone()));
    }
}
