//! # Load Collector - System Load Telemetry
//!
//! Samples kernel load averages and scheduling entity counts, normalizes the
//! averages by the number of logical CPUs and exposes every figure under a
//! slash-delimited metric namespace such as `/intel/procfs/load/min1`.
//!
//! ## Features
//!
//! - **Two load sources**: `/proc/loadavg` parsing on Linux, kernel counters elsewhere
//! - **Per-CPU normalization**: `min1_rel`, `min5_rel`, `min15_rel`
//! - **Metric discovery**: enumerate every namespace with its description
//! - **Selective collection**: fetch only the requested metrics, timestamped
//! - **HTTP host**: serve the plugin entry points as JSON endpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use load_collector::{CollectorConfig, LoadCollector, MetricType};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut collector = LoadCollector::new(&CollectorConfig::default())?;
//!     let requested = vec![MetricType::new("/intel/procfs/load/min1".parse()?)];
//!
//!     for metric in collector.collect_metrics(&requested)? {
//!         println!("{} = {:?}", metric.namespace, metric.data);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use error::{LoadError, Result};
pub use metrics::{
    collector::{LoadCollector, PlatformSource},
    config::CollectorConfig,
    cpus::{CpuCount, CpuCountResolver, CpuStrategy, KernelResolver, LscpuResolver},
    data::{LoadSample, MetricValue, RawLoad, SchedulingCounts},
    kernel::{KernelCounters, KernelSource, SystemCounters},
    namespace::{MetricDescriptor, Namespace},
    plugin::{meta, ConfigPolicy, ConfigValue, MetricType, PluginConfig, PluginMeta},
    procfs::ProcfsSource,
    traits::LoadSource,
};

pub use web::{start_web_server, WebConfig};

/// Vendor segment of every metric namespace
pub const VENDOR: &str = "intel";

/// Plugin name segment of every metric namespace
pub const PLUGIN_NAME: &str = "load";

/// Plugin version reported to the host
pub const PLUGIN_VERSION: u32 = 3;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8181;
