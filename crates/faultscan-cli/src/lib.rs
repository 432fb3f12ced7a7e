//! Driver for the `faultscan` binary.

pub mod driver;

pub use driver::{Driver, DriverError, RunSummary};
