//! Data structures for load metrics.

use super::cpus::CpuCount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling entity counts as reported by the load source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingCounts {
    /// Currently runnable kernel scheduling entities (processes, threads)
    pub runnable: u64,
    /// Kernel scheduling entities that currently exist on the system
    pub existing: u64,
}

/// An unprocessed reading from a load source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLoad {
    pub min1: f64,
    pub min5: f64,
    pub min15: f64,
    pub scheduling: SchedulingCounts,
}

/// One point-in-time load reading, normalized by CPU count.
///
/// Serialized field names match the metric namespace suffixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSample {
    /// Jobs in the run queue or waiting for disk I/O, averaged over 1 minute
    pub min1: f64,
    /// Jobs in the run queue or waiting for disk I/O, averaged over 5 minutes
    pub min5: f64,
    /// Jobs in the run queue or waiting for disk I/O, averaged over 15 minutes
    pub min15: f64,
    /// `min1` per logical CPU
    pub min1_rel: f64,
    /// `min5` per logical CPU
    pub min5_rel: f64,
    /// `min15` per logical CPU
    pub min15_rel: f64,
    /// Currently runnable kernel scheduling entities
    #[serde(rename = "runnable_scheduling")]
    pub runnable_entities: u64,
    /// Kernel scheduling entities that currently exist
    #[serde(rename = "existing_scheduling")]
    pub existing_entities: u64,
}

impl LoadSample {
    /// Build a sample from a raw reading.
    ///
    /// Scheduling counts are copied through unchanged, even when the source
    /// reports more runnable than existing entities.
    pub fn build(raw: &RawLoad, cpus: CpuCount) -> Self {
        let cpus = cpus.get() as f64;
        Self {
            min1: raw.min1,
            min5: raw.min5,
            min15: raw.min15,
            min1_rel: raw.min1 / cpus,
            min5_rel: raw.min5 / cpus,
            min15_rel: raw.min15 / cpus,
            runnable_entities: raw.scheduling.runnable,
            existing_entities: raw.scheduling.existing,
        }
    }
}

/// A single metric value resolved from a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(u64),
    Float(f64),
}

impl MetricValue {
    /// The value as a float, whatever its stored type.
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Float(v) => v,
            MetricValue::Int(v) => v as f64,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Int(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Int(value)
    }
}
