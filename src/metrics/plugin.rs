//! Types exchanged with the hosting collection protocol.

use super::data::MetricValue;
use super::namespace::Namespace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the option overriding the procfs root.
pub const PROC_PATH_OPTION: &str = "proc_path";

/// A configuration value supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    /// The value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

/// Per-request configuration, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfig {
    items: BTreeMap<String, ConfigValue>,
}

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, replacing any previous value.
    pub fn with_item(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.items.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.items.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A metric as seen by the host: a namespace with metadata, and, once
/// collected, a value and the time it was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricType {
    pub namespace: Namespace,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "PluginConfig::is_empty")]
    pub config: PluginConfig,
}

impl MetricType {
    /// A bare request for the given namespace.
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            description: String::new(),
            unit: String::new(),
            data: None,
            timestamp: None,
            config: PluginConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PluginConfig) -> Self {
        self.config = config;
        self
    }
}

/// Kind of value a configuration option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    String,
    Integer,
    Float,
    Bool,
}

/// One recognized configuration option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRule {
    /// Namespace prefix the option applies to
    pub namespace: Namespace,
    pub key: String,
    pub kind: ConfigKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ConfigValue>,
}

/// The set of configuration options the plugin understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPolicy {
    pub rules: Vec<ConfigRule>,
}

impl ConfigPolicy {
    pub fn rule(&self, key: &str) -> Option<&ConfigRule> {
        self.rules.iter().find(|rule| rule.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Collector,
}

/// Static description of the plugin, supplied once at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    pub version: u32,
    pub plugin_type: PluginType,
    pub content_types: Vec<String>,
    /// Maximum number of in-flight requests per instance
    pub concurrency_count: usize,
}

/// Metadata for this plugin.
pub fn meta() -> PluginMeta {
    PluginMeta {
        name: crate::PLUGIN_NAME.to_string(),
        version: crate::PLUGIN_VERSION,
        plugin_type: PluginType::Collector,
        content_types: vec!["json".to_string()],
        concurrency_count: 1,
    }
}
