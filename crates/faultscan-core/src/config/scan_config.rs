//! Working-tree scan configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Files larger than this many bytes are skipped. Default: 2 MiB.
    pub max_file_size: Option<u64>,
    /// Skip files that look binary (NUL bytes, no UTF-16 BOM). Default: true.
    pub skip_binary: Option<bool>,
}

impl ScanConfig {
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(2 * 1024 * 1024)
    }

    pub fn effective_skip_binary(&self) -> bool {
        self.skip_binary.unwrap_or(true)
    }
}
