//! Persistence layer: input table, append-only output table, and the
//! resumable result cache.

pub mod cache;
pub mod input;
pub mod output;

pub use cache::{LoadReport, LoadState, MergeStats, ResultCache};
pub use input::{read_input, URL_COLUMN};
pub use output::{OutputTable, OUTPUT_HEADER};
