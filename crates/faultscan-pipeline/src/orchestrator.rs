//! Batch orchestrator: fixed-size batches, a bounded worker pool, and a
//! panic boundary around every unit.
//!
//! Results of a batch arrive over a channel in completion order. A unit
//! that panics is logged and reported as `None`; the pool and the rest of
//! the batch are unaffected.

use std::fmt::Display;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice::Chunks;
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use faultscan_core::errors::{ErrorCode, PipelineError};
use faultscan_core::tracing::panic::payload_message;

/// One finished batch, handed to the driver before the next one starts.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// 1-based.
    pub index: usize,
    pub total: usize,
    /// Completion order, not input order. `None` marks a failed unit.
    pub results: Vec<Option<T>>,
    pub elapsed: Duration,
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

pub struct Orchestrator {
    pool: ThreadPool,
    batch_size: usize,
}

impl Orchestrator {
    pub fn new(workers: usize, batch_size: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("faultscan-worker-{i}"))
            .build()?;
        Ok(Self {
            pool,
            batch_size: batch_size.max(1),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }

    /// Run `unit` over every item concurrently and collect the outcomes.
    pub fn run_batch<I, T, F>(&self, items: &[I], unit: &F) -> Vec<Option<T>>
    where
        I: Display + Sync,
        T: Send,
        F: Fn(&I) -> Option<T> + Sync,
    {
        let (tx, rx) = crossbeam_channel::bounded(items.len().max(1));
        self.pool.scope(|scope| {
            for item in items {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = match catch_unwind(AssertUnwindSafe(|| unit(item))) {
                        Ok(outcome) => outcome,
                        Err(payload) => {
                            let err = PipelineError::Panicked {
                                url: item.to_string(),
                                message: payload_message(payload.as_ref()),
                            };
                            tracing::error!(url = %item, code = err.error_code(), "{err}");
                            None
                        }
                    };
                    // The receiver outlives the scope, so this cannot fail.
                    let _ = tx.send(outcome);
                });
            }
        });
        drop(tx);
        rx.into_iter().collect()
    }

    /// Lazily process `items` batch by batch.
    pub fn batches<'a, I, T, F>(&'a self, items: &'a [I], unit: F) -> Batches<'a, I, T, F>
    where
        I: Display + Sync,
        T: Send,
        F: Fn(&I) -> Option<T> + Sync,
    {
        Batches {
            orchestrator: self,
            chunks: items.chunks(self.batch_size),
            index: 0,
            total: self.batch_count(items.len()),
            unit,
            _results: PhantomData,
        }
    }
}

pub struct Batches<'a, I, T, F> {
    orchestrator: &'a Orchestrator,
    chunks: Chunks<'a, I>,
    index: usize,
    total: usize,
    unit: F,
    _results: PhantomData<fn() -> T>,
}

impl<I, T, F> Batches<'_, I, T, F> {
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<I, T, F> Iterator for Batches<'_, I, T, F>
where
    I: Display + Sync,
    T: Send,
    F: Fn(&I) -> Option<T> + Sync,
{
    type Item = BatchReport<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        self.index += 1;
        let start = Instant::now();
        tracing::info!(batch = self.index, total = self.total, size = chunk.len(), "batch started");

        let results = self.orchestrator.run_batch(chunk, &self.unit);
        let report = BatchReport {
            index: self.index,
            total: self.total,
            results,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            batch = report.index,
            total = report.total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch finished"
        );
        Some(report)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}
