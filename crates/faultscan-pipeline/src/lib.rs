//! Repository acquisition, the per-repository pipeline, and the batch
//! orchestrator that runs pipelines concurrently.

pub mod acquire;
pub mod orchestrator;
pub mod pipeline;

pub use acquire::{AcquireReport, Acquirer, Fetcher, GitFetcher, RetryPolicy};
pub use orchestrator::{BatchReport, Batches, Orchestrator};
pub use pipeline::{PipelineOutcome, PipelineState, RepositoryPipeline, WorkingTree};
