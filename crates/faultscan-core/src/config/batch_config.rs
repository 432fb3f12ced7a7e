//! Batch orchestration configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Repositories per batch. Default: 50.
    pub batch_size: Option<usize>,
    /// Worker threads. Default: available parallelism.
    pub workers: Option<usize>,
    /// Cache keys per appended fragment. Default: 1000.
    pub cache_flush_size: Option<usize>,
}

impl BatchConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(50)
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn effective_cache_flush_size(&self) -> usize {
        self.cache_flush_size.unwrap_or(1000)
    }
}
