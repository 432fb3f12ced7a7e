//! Domain records shared across the workspace.

pub mod language;
pub mod repository;
pub mod verdict;

pub use language::Language;
pub use repository::{FileResult, RepositoryRef, RepositoryResult};
pub use verdict::Verdict;
