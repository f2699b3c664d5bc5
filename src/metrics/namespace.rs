//! Mapping between load sample fields and metric namespaces.
//!
//! Every field of [`LoadSample`] is addressed as
//! `/<vendor>/<source-kind>/<plugin>/<field>`. The field table below is the
//! single source of truth for which metrics exist, what they mean and how to
//! read them from a sample.

use super::data::{LoadSample, MetricValue};
use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fixed leading segments (vendor, source kind, plugin name).
pub const PREFIX_LEN: usize = 3;

/// A `/`-delimited metric address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(Vec<String>);

impl Namespace {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// A copy of this namespace with one more trailing segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The field path following the fixed prefix.
    ///
    /// Every segment after the prefix is kept, joined with `/`. Sample fields
    /// are flat, so a deeper path such as `min1/extra` never resolves and
    /// fails the batch as an unknown metric instead of being read as `min1`.
    ///
    /// Fails if the namespace does not have at least one segment after the
    /// prefix.
    pub fn field_path(&self) -> Result<String> {
        if self.0.len() <= PREFIX_LEN {
            return Err(LoadError::namespace_error(
                self.to_string(),
                format!("namespace length is too short (len = {})", self.0.len()),
            ));
        }
        Ok(self.0[PREFIX_LEN..].join("/"))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Namespace {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(LoadError::namespace_error(s, "namespace is empty"));
        }
        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(LoadError::namespace_error(s, "namespace contains an empty segment"));
        }
        Ok(Self(segments))
    }
}

impl TryFrom<String> for Namespace {
    type Error = LoadError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.to_string()
    }
}

/// Static metadata for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub description: &'static str,
    pub unit: &'static str,
}

struct FieldSpec {
    name: &'static str,
    descriptor: MetricDescriptor,
    read: fn(&LoadSample) -> MetricValue,
}

const fn field(
    name: &'static str,
    description: &'static str,
    read: fn(&LoadSample) -> MetricValue,
) -> FieldSpec {
    FieldSpec {
        name,
        descriptor: MetricDescriptor {
            description,
            unit: "",
        },
        read,
    }
}

static FIELDS: [FieldSpec; 8] = [
    field(
        "min1",
        "number of jobs in the run queue (state R) or waiting for disk I/O (state D) averaged over 1 minute",
        |s| MetricValue::Float(s.min1),
    ),
    field(
        "min5",
        "number of jobs in the run queue (state R) or waiting for disk I/O (state D) averaged over 5 minutes",
        |s| MetricValue::Float(s.min5),
    ),
    field(
        "min15",
        "number of jobs in the run queue (state R) or waiting for disk I/O (state D) averaged over 15 minutes",
        |s| MetricValue::Float(s.min15),
    ),
    field(
        "min1_rel",
        "number of jobs in the run queue (state R) or waiting for disk I/O (state D) averaged over 1 minute per CPU",
        |s| MetricValue::Float(s.min1_rel),
    ),
    field(
        "min5_rel",
        "number of jobs in the run queue (state R) or waiting for disk I/O (state D) averaged over 5 minutes per CPU",
        |s| MetricValue::Float(s.min5_rel),
    ),
    field(
        "min15_rel",
        "number of jobs in the run queue (state R) or waiting for disk I/O (state D) averaged over 15 minutes per CPU",
        |s| MetricValue::Float(s.min15_rel),
    ),
    field(
        "runnable_scheduling",
        "The number of currently runnable kernel scheduling entities (processes, threads)",
        |s| MetricValue::Int(s.runnable_entities),
    ),
    field(
        "existing_scheduling",
        "The number of kernel scheduling entities that currently exist on the system",
        |s| MetricValue::Int(s.existing_entities),
    ),
];

/// Names of every addressable field, in table order.
pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}

/// Metadata for a field; unknown names get an empty descriptor.
pub fn descriptor(name: &str) -> MetricDescriptor {
    FIELDS
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.descriptor)
        .unwrap_or_default()
}

/// Every metric a sample exposes, addressed under `prefix`.
///
/// The result depends only on the field table, never on the sampled values.
pub fn enumerate(_sample: &LoadSample, prefix: &Namespace) -> Vec<(Namespace, MetricDescriptor)> {
    FIELDS
        .iter()
        .map(|f| (prefix.child(f.name), f.descriptor))
        .collect()
}

/// Read the named field from a sample.
pub fn resolve(sample: &LoadSample, field_name: &str) -> Result<MetricValue> {
    FIELDS
        .iter()
        .find(|f| f.name == field_name)
        .map(|f| (f.read)(sample))
        .ok_or_else(|| LoadError::UnknownField(field_name.to_string()))
}
