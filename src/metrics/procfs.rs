//! Text backend reading the kernel's `loadavg` pseudo-file.
//!
//! The first line must look like `0.40 0.08 0.16 1/100 1111`: three load
//! averages, a `runnable/existing` scheduling pair and the most recently
//! created PID, which is ignored.

use crate::error::{LoadError, Result};
use crate::metrics::data::{RawLoad, SchedulingCounts};
use crate::metrics::namespace::Namespace;
use crate::metrics::plugin::{ConfigKind, ConfigRule, ConfigValue, PluginConfig, PROC_PATH_OPTION};
use crate::metrics::traits::LoadSource;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Default procfs mount point.
pub const DEFAULT_PROC_PATH: &str = "/proc";

/// File name of the load average pseudo-file under the procfs root.
pub const LOADAVG_FILE: &str = "loadavg";

/// Load source backed by `<proc root>/loadavg`.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    path: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::from_root(DEFAULT_PROC_PATH)
    }
}

impl ProcfsSource {
    /// Read load figures from the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read load figures from `loadavg` under the given procfs root.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(LOADAVG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<RawLoad> {
        let file = File::open(path).map_err(|e| {
            error!("Cannot open {}: {}", path.display(), e);
            LoadError::source_error(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mut line = String::new();
        BufReader::new(file).read_line(&mut line).map_err(|e| {
            LoadError::source_error(format!("cannot read {}: {}", path.display(), e))
        })?;

        let raw = parse_loadavg(&line)?;
        debug!("Read {:?} from {}", raw, path.display());
        Ok(raw)
    }
}

impl LoadSource for ProcfsSource {
    const SOURCE_KIND: &'static str = "procfs";

    fn sample(&mut self) -> Result<RawLoad> {
        Self::read(&self.path)
    }

    fn sample_with(&mut self, config: &PluginConfig) -> Result<RawLoad> {
        match config.get(PROC_PATH_OPTION) {
            None => self.sample(),
            Some(value) => {
                let root = value.as_str().ok_or_else(|| {
                    LoadError::config_error(format!("{} must be a string, got {:?}", PROC_PATH_OPTION, value))
                })?;
                Self::read(&Path::new(root).join(LOADAVG_FILE))
            }
        }
    }

    fn config_rules(prefix: &Namespace) -> Vec<ConfigRule> {
        vec![ConfigRule {
            namespace: prefix.clone(),
            key: PROC_PATH_OPTION.to_string(),
            kind: ConfigKind::String,
            required: false,
            default: Some(ConfigValue::from(DEFAULT_PROC_PATH)),
        }]
    }
}

/// Parse the first line of `loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<RawLoad> {
    let line = content.lines().next().unwrap_or_default();
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.len() < 5 {
        return Err(LoadError::format_error(
            format!("expected at least 5 fields, found {}", fields.len()),
            line,
        ));
    }

    let min1 = parse_average(fields[0], line)?;
    let min5 = parse_average(fields[1], line)?;
    let min15 = parse_average(fields[2], line)?;
    let scheduling = parse_scheduling(fields[3], line)?;

    Ok(RawLoad {
        min1,
        min5,
        min15,
        scheduling,
    })
}

fn parse_average(token: &str, line: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LoadError::format_error(
            format!("invalid load average {:?}", token),
            line,
        )),
    }
}

fn parse_scheduling(token: &str, line: &str) -> Result<SchedulingCounts> {
    let parts: Vec<&str> = token.split('/').collect();
    let &[runnable, existing] = parts.as_slice() else {
        return Err(LoadError::format_error(
            format!("scheduling field {:?} is not runnable/existing", token),
            line,
        ));
    };

    let parse = |part: &str| {
        part.parse::<u64>().map_err(|_| {
            LoadError::format_error(format!("invalid scheduling count {:?}", part), line)
        })
    };

    Ok(SchedulingCounts {
        runnable: parse(runnable)?,
        existing: parse(existing)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn proc_root(content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LOADAVG_FILE), content).unwrap();
        dir
    }

    #[test]
    fn test_parse_loadavg() {
        let raw = parse_loadavg("0.40 0.08 0.16 1/100 1111\n").unwrap();
        assert_eq!(raw.min1, 0.40);
        assert_eq!(raw.min5, 0.08);
        assert_eq!(raw.min15, 0.16);
        assert_eq!(raw.scheduling, SchedulingCounts { runnable: 1, existing: 100 });
    }

    #[test]
    fn test_parse_only_first_line() {
        let raw = parse_loadavg("1.00 2.00 3.00 4/5 6\ngarbage").unwrap();
        assert_eq!(raw.min15, 3.0);
    }

    #[test]
    fn test_parse_rejects_too_few_fields() {
        let err = parse_loadavg("0.40 0.08 0.16 1/100").unwrap_err();
        assert!(matches!(err, LoadError::Format { ref raw, .. } if raw == "0.40 0.08 0.16 1/100"));
        assert!(parse_loadavg("").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_scheduling_separator() {
        let err = parse_loadavg("0.40 0.08 0.16 1-100 1111").unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
        assert!(err.is_source_error());
    }

    #[test]
    fn test_parse_rejects_extra_scheduling_parts() {
        assert!(parse_loadavg("0.40 0.08 0.16 1/100/7 1111").is_err());
        assert!(parse_loadavg("0.40 0.08 0.16 x/100 1111").is_err());
        assert!(parse_loadavg("0.40 0.08 0.16 1/ 1111").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_average() {
        assert!(parse_loadavg("0.40 abc 0.16 1/100 1111").is_err());
        assert!(parse_loadavg("NaN 0.08 0.16 1/100 1111").is_err());
    }

    #[test]
    fn test_sample_reads_file() {
        let dir = proc_root("0.40 0.08 0.16 1/100 1111\n");
        let mut source = ProcfsSource::from_root(dir.path());
        let raw = source.sample().unwrap();
        assert_eq!(raw.scheduling.existing, 100);
    }

    #[test]
    fn test_sample_missing_file_is_source_error() {
        let dir = TempDir::new().unwrap();
        let mut source = ProcfsSource::from_root(dir.path());
        let err = source.sample().unwrap_err();
        assert!(matches!(err, LoadError::Source(_)));
    }

    #[test]
    fn test_sample_with_overrides_root() {
        let dir = proc_root("2.00 1.00 0.50 3/300 42\n");
        let mut source = ProcfsSource::from_root("/nonexistent-proc");
        let config = PluginConfig::new().with_item(PROC_PATH_OPTION, dir.path().to_str().unwrap());

        let raw = source.sample_with(&config).unwrap();
        assert_eq!(raw.min1, 2.0);
        assert_eq!(raw.scheduling.runnable, 3);
    }

    #[test]
    fn test_sample_with_rejects_non_string_root() {
        let mut source = ProcfsSource::default();
        let config = PluginConfig::new().with_item(PROC_PATH_OPTION, ConfigValue::Int(1));
        assert!(matches!(source.sample_with(&config), Err(LoadError::Config(_))));
    }
}
