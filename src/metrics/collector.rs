//! Load collector implementation.
//!
//! [`LoadCollector`] serves the two query entry points of the plugin:
//! enumerating the available metrics and collecting requested values. Each
//! call takes a fresh reading from its load source; nothing is kept between
//! calls except the CPU count and the open source.

use crate::error::{LoadError, Result};
use crate::metrics::{
    config::CollectorConfig,
    cpus::{CpuCount, CpuCountResolver},
    data::LoadSample,
    namespace::{self, Namespace},
    plugin::{ConfigPolicy, MetricType, PluginConfig},
    traits::LoadSource,
};
use chrono::Utc;
use tracing::{debug, error, info};

#[cfg(target_os = "linux")]
use crate::metrics::procfs::ProcfsSource;

#[cfg(not(target_os = "linux"))]
use crate::metrics::kernel::{KernelSource, SystemCounters};

/// The load source used on this platform.
#[cfg(target_os = "linux")]
pub type PlatformSource = ProcfsSource;

/// The load source used on this platform.
#[cfg(not(target_os = "linux"))]
pub type PlatformSource = KernelSource<SystemCounters>;

#[cfg(target_os = "linux")]
fn open_platform_source(config: &CollectorConfig) -> Result<PlatformSource> {
    Ok(ProcfsSource::from_root(&config.proc_path))
}

#[cfg(not(target_os = "linux"))]
fn open_platform_source(_config: &CollectorConfig) -> Result<PlatformSource> {
    KernelSource::open()
}

/// Collector façade tying the CPU count, a load source and the namespace
/// mapping together.
///
/// Requests take `&mut self`, so one instance serves one request at a time.
/// Hosts that call from several threads must serialize access themselves.
#[derive(Debug)]
pub struct LoadCollector<S = PlatformSource> {
    source: S,
    cpus: CpuCount,
}

impl LoadCollector<PlatformSource> {
    /// Create a collector for this platform.
    ///
    /// Fails if the CPU count cannot be resolved or the source cannot be
    /// opened; there is no degraded mode.
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let resolver = config.cpu_strategy.resolver();
        let source = open_platform_source(config)?;
        Self::with_source(resolver.as_ref(), source)
    }
}

impl<S: LoadSource> LoadCollector<S> {
    /// Create a collector over an explicit resolver and source.
    pub fn with_source(resolver: &dyn CpuCountResolver, source: S) -> Result<Self> {
        let cpus = resolver.resolve().map_err(|e| {
            error!("Error while reading number of cpus: {}", e);
            e
        })?;
        info!("Load collector created ({} source, {} CPUs)", S::SOURCE_KIND, cpus);
        Ok(Self { source, cpus })
    }

    pub fn cpu_count(&self) -> CpuCount {
        self.cpus
    }

    /// The fixed `vendor/source-kind/plugin` prefix of every metric.
    pub fn prefix() -> Namespace {
        Namespace::new([crate::VENDOR, S::SOURCE_KIND, crate::PLUGIN_NAME])
    }

    fn sample(&mut self, config: &PluginConfig) -> Result<LoadSample> {
        let raw = self.source.sample_with(config).map_err(|e| {
            error!("Could not read metrics: {}", e);
            e
        })?;
        Ok(LoadSample::build(&raw, self.cpus))
    }

    /// List every metric this collector can provide.
    pub fn get_metric_types(&mut self, config: &PluginConfig) -> Result<Vec<MetricType>> {
        debug!("Calling get_metric_types()");
        let sample = self.sample(config)?;

        let metric_types = namespace::enumerate(&sample, &Self::prefix())
            .into_iter()
            .map(|(ns, info)| {
                debug!("MetricType created {}", ns);
                MetricType {
                    description: info.description.to_string(),
                    unit: info.unit.to_string(),
                    config: config.clone(),
                    ..MetricType::new(ns)
                }
            })
            .collect();

        Ok(metric_types)
    }

    /// Collect values for the requested metrics.
    ///
    /// The whole batch fails if any namespace is malformed or unknown; no
    /// partial result is returned. Metrics sharing a configuration share one
    /// reading; each distinct configuration gets its own.
    pub fn collect_metrics(&mut self, requested: &[MetricType]) -> Result<Vec<MetricType>> {
        debug!("Calling collect_metrics() for {} metrics", requested.len());
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let fields = requested
            .iter()
            .map(|metric| metric.namespace.field_path())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                error!("{}", e);
                e
            })?;

        let mut samples: Vec<(&PluginConfig, LoadSample)> = Vec::new();
        let mut collected = Vec::with_capacity(requested.len());

        for (metric, field) in requested.iter().zip(fields) {
            let sample = match samples.iter().find(|(config, _)| **config == metric.config) {
                Some((_, sample)) => *sample,
                None => {
                    let sample = self.sample(&metric.config)?;
                    samples.push((&metric.config, sample));
                    sample
                }
            };

            let value = namespace::resolve(&sample, &field).map_err(|e| {
                error!("Requested stat {} is not available", metric.namespace);
                LoadError::namespace_error(metric.namespace.to_string(), e.to_string())
            })?;
            debug!("Found value {} for {}", value, metric.namespace);

            collected.push(MetricType {
                data: Some(value),
                timestamp: Some(Utc::now()),
                ..MetricType::new(metric.namespace.clone())
            });
        }

        Ok(collected)
    }

    /// The configuration options this collector's source recognizes.
    pub fn get_config_policy(&self) -> ConfigPolicy {
        ConfigPolicy {
            rules: S::config_rules(&Self::prefix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::data::{MetricValue, RawLoad, SchedulingCounts};
    use crate::metrics::plugin::{ConfigKind, ConfigValue, PROC_PATH_OPTION};
    use crate::metrics::procfs::ProcfsSource;

    struct FixedCpus(usize);

    impl CpuCountResolver for FixedCpus {
        fn resolve(&self) -> Result<CpuCount> {
            CpuCount::new(self.0).ok_or_else(|| LoadError::resolution_error("no CPUs"))
        }
    }

    /// Source returning a canned reading and counting samples.
    struct CannedSource {
        raw: RawLoad,
        samples: usize,
    }

    impl CannedSource {
        fn new() -> Self {
            Self {
                raw: RawLoad {
                    min1: 0.40,
                    min5: 0.08,
                    min15: 0.16,
                    scheduling: SchedulingCounts {
                        runnable: 1,
                        existing: 100,
                    },
                },
                samples: 0,
            }
        }
    }

    impl LoadSource for CannedSource {
        const SOURCE_KIND: &'static str = "canned";

        fn sample(&mut self) -> Result<RawLoad> {
            self.samples += 1;
            Ok(self.raw)
        }
    }

    struct BrokenSource;

    impl LoadSource for BrokenSource {
        const SOURCE_KIND: &'static str = "broken";

        fn sample(&mut self) -> Result<RawLoad> {
            Err(LoadError::format_error("too few fields", "0.1"))
        }
    }

    fn request(field: &str) -> MetricType {
        MetricType::new(LoadCollector::<CannedSource>::prefix().child(field))
    }

    #[test]
    fn test_construction_fails_without_cpus() {
        let result = LoadCollector::with_source(&FixedCpus(0), CannedSource::new());
        assert!(matches!(result, Err(LoadError::Resolution(_))));
    }

    #[test]
    fn test_metric_types_carry_descriptions() {
        let mut collector = LoadCollector::with_source(&FixedCpus(2), CannedSource::new()).unwrap();
        let types = collector.get_metric_types(&PluginConfig::new()).unwrap();

        assert_eq!(types.len(), 8);
        assert!(types.iter().all(|t| t.namespace.len() == 4));
        assert!(types.iter().all(|t| !t.description.is_empty()));
        assert!(types.iter().all(|t| t.data.is_none()));
        assert_eq!(types[0].namespace.segments()[1], "canned");
    }

    #[test]
    fn test_collect_resolves_values() {
        let mut collector = LoadCollector::with_source(&FixedCpus(2), CannedSource::new()).unwrap();
        let metrics = collector
            .collect_metrics(&[request("min1_rel"), request("existing_scheduling")])
            .unwrap();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].data, Some(MetricValue::Float(0.40 / 2.0)));
        assert_eq!(metrics[1].data, Some(MetricValue::Int(100)));
        assert!(metrics.iter().all(|m| m.timestamp.is_some()));
        assert_eq!(collector.source.samples, 1);
    }

    #[test]
    fn test_collect_unknown_field_fails_whole_batch() {
        let mut collector = LoadCollector::with_source(&FixedCpus(1), CannedSource::new()).unwrap();
        let err = collector
            .collect_metrics(&[request("min1"), request("scheduling")])
            .unwrap_err();

        match err {
            LoadError::Namespace { namespace, .. } => {
                assert_eq!(namespace, "/intel/canned/load/scheduling")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_collect_short_namespace_fails_before_sampling() {
        let mut collector = LoadCollector::with_source(&FixedCpus(1), CannedSource::new()).unwrap();
        let short = MetricType::new(Namespace::new(["intel", "canned", "load"]));

        let result = collector.collect_metrics(&[request("min5"), short]);
        assert!(matches!(result, Err(LoadError::Namespace { .. })));
        assert_eq!(collector.source.samples, 0);
    }

    #[test]
    fn test_collect_empty_request() {
        let mut collector = LoadCollector::with_source(&FixedCpus(1), CannedSource::new()).unwrap();
        assert!(collector.collect_metrics(&[]).unwrap().is_empty());
        assert_eq!(collector.source.samples, 0);
    }

    #[test]
    fn test_source_failure_propagates() {
        let mut collector = LoadCollector::with_source(&FixedCpus(1), BrokenSource).unwrap();
        let err = collector.get_metric_types(&PluginConfig::new()).unwrap_err();
        assert!(err.is_source_error());

        let err = collector
            .collect_metrics(&[MetricType::new(LoadCollector::<BrokenSource>::prefix().child("min1"))])
            .unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
    }

    #[test]
    fn test_config_policy_declares_proc_path() {
        let collector =
            LoadCollector::with_source(&FixedCpus(1), ProcfsSource::default()).unwrap();
        let policy = collector.get_config_policy();

        assert_eq!(policy.rules.len(), 1);
        let rule = policy.rule(PROC_PATH_OPTION).unwrap();
        assert_eq!(rule.namespace.to_string(), "/intel/procfs/load");
        assert_eq!(rule.kind, ConfigKind::String);
        assert!(!rule.required);
        assert_eq!(rule.default, Some(ConfigValue::Str("/proc".to_string())));
    }

    #[test]
    fn test_config_policy_empty_for_unconfigurable_source() {
        let collector = LoadCollector::with_source(&FixedCpus(1), CannedSource::new()).unwrap();
        assert!(collector.get_config_policy().rules.is_empty());
    }

    #[test]
    fn test_collect_samples_once_per_distinct_config() {
        let mut collector = LoadCollector::with_source(&FixedCpus(1), CannedSource::new()).unwrap();
        let other = PluginConfig::new().with_item("mode", "other");

        let metrics = collector
            .collect_metrics(&[
                request("min1"),
                request("min5").with_config(other.clone()),
                request("min15"),
                request("min1_rel").with_config(other),
            ])
            .unwrap();

        assert_eq!(metrics.len(), 4);
        assert_eq!(collector.source.samples, 2);
    }
}
