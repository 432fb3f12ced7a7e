//! Core types, errors, config, tracing and process plumbing for faultscan.
//!
//! Every other crate in the workspace depends on this one. It owns the
//! verdict lattice, the repository/result records, one error enum per
//! subsystem and the layered configuration.

pub mod config;
pub mod errors;
pub mod process;
pub mod tracing;
pub mod types;

pub use types::{FileResult, Language, RepositoryRef, RepositoryResult, Verdict};
