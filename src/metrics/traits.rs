//! Traits for load data acquisition.

use crate::error::Result;
use crate::metrics::data::RawLoad;
use crate::metrics::namespace::Namespace;
use crate::metrics::plugin::{ConfigRule, PluginConfig};

/// An OS-specific sampler producing one raw load reading per call.
///
/// Implementations are swappable without changes to anything downstream;
/// each deployment picks one at compile time.
pub trait LoadSource: Send {
    /// Namespace segment naming the kind of source, e.g. `procfs`.
    const SOURCE_KIND: &'static str;

    /// Take a fresh reading.
    fn sample(&mut self) -> Result<RawLoad>;

    /// Take a fresh reading honoring per-request configuration.
    ///
    /// Sources without configurable options ignore `config`.
    fn sample_with(&mut self, config: &PluginConfig) -> Result<RawLoad> {
        let _ = config;
        self.sample()
    }

    /// Configuration options honored by `sample_with`, declared under `prefix`.
    fn config_rules(prefix: &Namespace) -> Vec<ConfigRule> {
        let _ = prefix;
        Vec::new()
    }
}
