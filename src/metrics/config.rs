//! Collector configuration.

use crate::metrics::cpus::CpuStrategy;
use crate::metrics::procfs::DEFAULT_PROC_PATH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration applied when a collector is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Root of the procfs mount holding `loadavg`
    pub proc_path: PathBuf,
    /// How the CPU count is resolved
    pub cpu_strategy: CpuStrategy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from(DEFAULT_PROC_PATH),
            cpu_strategy: CpuStrategy::default(),
        }
    }
}

impl CollectorConfig {
    /// Set the procfs root.
    pub fn with_proc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_path = path.into();
        self
    }

    /// Set the CPU count strategy.
    pub fn with_cpu_strategy(mut self, strategy: CpuStrategy) -> Self {
        self.cpu_strategy = strategy;
        self
    }
}
