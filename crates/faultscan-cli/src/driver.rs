//! The driver loop: load the cache, replay cached rows, run the remaining
//! repositories batch by batch, and persist after every batch.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use faultscan_analysis::{CapabilityRegistry, ClassifierSettings, FileClassifier};
use faultscan_core::config::FaultscanConfig;
use faultscan_core::errors::{error_code, ErrorCode, StorageError};
use faultscan_core::{RepositoryRef, RepositoryResult};
use faultscan_pipeline::{Acquirer, Fetcher, GitFetcher, Orchestrator, RepositoryPipeline, RetryPolicy};
use faultscan_storage::{read_input, OutputTable, ResultCache};

/// Errors that end a run with a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Worker pool could not start: {0}")]
    WorkerPool(String),
}

impl ErrorCode for DriverError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::WorkerPool(_) => error_code::PROCESS_ERROR,
        }
    }
}

/// Counts for the end-of-run log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inputs: usize,
    /// Inputs answered from the cache without fetching.
    pub replayed: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub batches_run: usize,
    pub batches_total: usize,
    pub cache_entries: usize,
}

pub struct Driver {
    config: FaultscanConfig,
    fetcher: Arc<dyn Fetcher>,
    registry: Option<Arc<CapabilityRegistry>>,
    policy: RetryPolicy,
    max_batches: Option<usize>,
}

impl Driver {
    pub fn new(config: FaultscanConfig) -> Self {
        let policy = RetryPolicy::from_config(&config.acquire);
        Self {
            config,
            fetcher: Arc::new(GitFetcher::new()),
            registry: None,
            policy,
            max_batches: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Use this registry instead of building one from `[analyzers]`.
    pub fn with_registry(mut self, registry: Arc<CapabilityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop after `n` batches; the rest is left for a later run.
    pub fn with_max_batches(mut self, max_batches: Option<usize>) -> Self {
        self.max_batches = max_batches;
        self
    }

    pub fn run(&self) -> Result<RunSummary, DriverError> {
        let start = Instant::now();
        let paths = &self.config.paths;
        let batch = &self.config.batch;

        let (mut cache, _) = ResultCache::load(paths.effective_cache_file(), batch.effective_cache_flush_size());
        let repositories = read_input(paths.effective_input())?;
        let mut output = OutputTable::create(paths.effective_output())?;

        let clone_dir = paths.effective_clone_dir();
        if let Err(e) = fs::create_dir_all(clone_dir) {
            tracing::warn!(path = %clone_dir.display(), error = %e, "staging directory could not be created");
        }

        let mut summary = RunSummary {
            inputs: repositories.len(),
            ..RunSummary::default()
        };

        let cached: Vec<&RepositoryResult> = repositories.iter().filter_map(|r| cache.get(r.url())).collect();
        summary.replayed = cached.len();
        if !cached.is_empty() {
            if let Err(e) = output.append(cached) {
                tracing::error!(code = e.error_code(), "{e}");
            }
            tracing::info!(replayed = summary.replayed, "cached results replayed into output table");
        }

        let pending: Vec<RepositoryRef> = repositories
            .into_iter()
            .filter(|r| !cache.contains(r.url()))
            .collect();

        let registry = match &self.registry {
            Some(registry) => Arc::clone(registry),
            None => Arc::new(CapabilityRegistry::from_config(&self.config.analyzers)),
        };
        let classifier = Arc::new(FileClassifier::new(
            registry,
            ClassifierSettings::from(&self.config.scan),
        ));
        let acquirer = Arc::new(Acquirer::new(
            Arc::clone(&self.fetcher),
            self.policy,
            self.config.acquire.effective_memo_capacity(),
        ));
        let pipeline = RepositoryPipeline::new(acquirer, classifier, clone_dir);
        let orchestrator = Orchestrator::new(batch.effective_workers(), batch.effective_batch_size())
            .map_err(|e| DriverError::WorkerPool(e.to_string()))?;

        summary.batches_total = orchestrator.batch_count(pending.len());
        tracing::info!(
            pending = pending.len(),
            cached = summary.replayed,
            batches = summary.batches_total,
            batch_size = orchestrator.batch_size(),
            workers = orchestrator.workers(),
            "run started"
        );

        let batches = orchestrator
            .batches(&pending, |repo: &RepositoryRef| pipeline.run(repo).into_result())
            .take(self.max_batches.unwrap_or(usize::MAX));

        for report in batches {
            summary.batches_run += 1;
            summary.processed += report.results.len();
            summary.succeeded += report.succeeded();
            summary.failed += report.failed();

            let fresh: Vec<RepositoryResult> = report.results.iter().flatten().cloned().collect();
            let merged = cache.merge(report.results);
            if let Err(e) = cache.flush() {
                tracing::error!(code = e.error_code(), "{e}");
            }
            if let Err(e) = output.append(&fresh) {
                tracing::error!(code = e.error_code(), "{e}");
            }

            tracing::info!(
                batch = report.index,
                total = report.total,
                succeeded = merged.inserted + merged.replaced,
                failed = merged.skipped,
                "batch {}/{} persisted",
                report.index,
                report.total
            );
        }

        summary.cache_entries = cache.len();
        tracing::info!(
            inputs = summary.inputs,
            replayed = summary.replayed,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            batches = summary.batches_run,
            cache_entries = summary.cache_entries,
            elapsed_s = start.elapsed().as_secs(),
            "run finished"
        );
        if summary.batches_run < summary.batches_total {
            tracing::info!(
                remaining = summary.batches_total - summary.batches_run,
                "stopped early, rerun to continue from the cache"
            );
        }
        Ok(summary)
    }
}
