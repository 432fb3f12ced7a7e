//! File system locations used by a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Paths for the input table, output table, staging area and cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Input table with a `repo_url` column. Default: `input.csv`.
    pub input: Option<PathBuf>,
    /// Output table. Default: `analyze_error_handling_output.csv`.
    pub output: Option<PathBuf>,
    /// Staging directory for working trees. Default: `cloned_repos`.
    pub clone_dir: Option<PathBuf>,
    /// Resumable result cache. Default: `analysis_cache.jsonl`.
    pub cache_file: Option<PathBuf>,
    /// Optional log file the log sink appends to.
    pub log_file: Option<PathBuf>,
}

impl PathsConfig {
    pub fn effective_input(&self) -> &Path {
        self.input.as_deref().unwrap_or(Path::new("input.csv"))
    }

    pub fn effective_output(&self) -> &Path {
        self.output
            .as_deref()
            .unwrap_or(Path::new("analyze_error_handling_output.csv"))
    }

    pub fn effective_clone_dir(&self) -> &Path {
        self.clone_dir.as_deref().unwrap_or(Path::new("cloned_repos"))
    }

    pub fn effective_cache_file(&self) -> &Path {
        self.cache_file
            .as_deref()
            .unwrap_or(Path::new("analysis_cache.jsonl"))
    }
}
