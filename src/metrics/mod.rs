//! Load metrics acquisition and namespace mapping.
//!
//! This module resolves the host CPU count, samples load figures from an
//! OS-specific source, normalizes them into a [`LoadSample`] and maps the
//! sample's fields onto the plugin's metric namespace.

pub mod collector;
pub mod config;
pub mod cpus;
pub mod data;
pub mod kernel;
pub mod namespace;
pub mod plugin;
pub mod procfs;
pub mod traits;

// Re-export commonly used items
pub use collector::{LoadCollector, PlatformSource};
pub use config::CollectorConfig;
pub use cpus::{CpuCount, CpuCountResolver, CpuStrategy};
pub use data::{LoadSample, MetricValue, RawLoad};
pub use namespace::Namespace;
pub use traits::LoadSource;
