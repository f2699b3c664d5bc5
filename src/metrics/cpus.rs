//! Logical CPU count resolution.
//!
//! The CPU count is resolved once when the collector is constructed and is
//! used as the denominator for the per-CPU load figures.

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::process::Command;
use tracing::debug;

/// Number of logical CPUs visible to the OS. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CpuCount(NonZeroUsize);

impl CpuCount {
    /// Returns `None` for zero.
    pub fn new(count: usize) -> Option<Self> {
        NonZeroUsize::new(count).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for CpuCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the CPU count is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuStrategy {
    /// Parse `lscpu -p` output
    Lscpu,
    /// Ask the kernel directly (`sysconf` or `sysctl hw.ncpu`)
    Kernel,
}

impl Default for CpuStrategy {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            CpuStrategy::Lscpu
        } else {
            CpuStrategy::Kernel
        }
    }
}

impl CpuStrategy {
    /// The resolver implementing this strategy.
    pub fn resolver(self) -> Box<dyn CpuCountResolver> {
        match self {
            CpuStrategy::Lscpu => Box::new(LscpuResolver::default()),
            CpuStrategy::Kernel => Box::new(KernelResolver),
        }
    }
}

/// Trait for determining the number of logical CPUs.
///
/// Implementations must fail rather than fall back to a default when the
/// underlying tool or interface is unavailable.
pub trait CpuCountResolver {
    fn resolve(&self) -> Result<CpuCount>;
}

/// Resolves the CPU count from `lscpu -p` output.
#[derive(Debug, Clone)]
pub struct LscpuResolver {
    program: String,
}

impl Default for LscpuResolver {
    fn default() -> Self {
        Self {
            program: "lscpu".to_string(),
        }
    }
}

impl LscpuResolver {
    /// Use a different `lscpu` executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CpuCountResolver for LscpuResolver {
    fn resolve(&self) -> Result<CpuCount> {
        let output = Command::new(&self.program)
            .arg("-p")
            .output()
            .map_err(|e| LoadError::resolution_error(format!("cannot run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(LoadError::resolution_error(format!(
                "{} -p exited with {}",
                self.program, output.status
            )));
        }

        let count = parse_lscpu(&String::from_utf8_lossy(&output.stdout))?;
        debug!("{} reported {} CPUs", self.program, count);
        Ok(count)
    }
}

/// Parse `lscpu -p` output into a CPU count.
///
/// Comment and blank lines are skipped; the count is the processor ID on the
/// last line plus one.
pub fn parse_lscpu(output: &str) -> Result<CpuCount> {
    let last = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .last()
        .ok_or_else(|| LoadError::resolution_error("lscpu output contains no CPU lines"))?;

    let id = last
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .parse::<usize>()
        .map_err(|e| LoadError::resolution_error(format!("cannot parse CPU id in {:?}: {}", last, e)))?;

    id.checked_add(1)
        .and_then(CpuCount::new)
        .ok_or_else(|| LoadError::resolution_error("CPU count overflow"))
}

/// Resolves the CPU count through a kernel configuration interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelResolver;

impl CpuCountResolver for KernelResolver {
    fn resolve(&self) -> Result<CpuCount> {
        let count = kernel_cpu_count()?;
        CpuCount::new(count)
            .ok_or_else(|| LoadError::resolution_error("kernel reported zero CPUs"))
    }
}

#[cfg(target_os = "linux")]
fn kernel_cpu_count() -> Result<usize> {
    // SAFETY: sysconf has no memory safety preconditions.
    let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if count < 0 {
        return Err(LoadError::resolution_error(format!(
            "sysconf(_SC_NPROCESSORS_ONLN) failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(count as usize)
}

#[cfg(any(
    target_os = "freebsd",
    target_os = "macos",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn kernel_cpu_count() -> Result<usize> {
    let mut ncpu: libc::c_int = 0;
    let mut size = std::mem::size_of::<libc::c_int>();
    // SAFETY: the name is NUL-terminated and `size` matches the output buffer.
    let rc = unsafe {
        libc::sysctlbyname(
            b"hw.ncpu\0".as_ptr() as *const libc::c_char,
            &mut ncpu as *mut libc::c_int as *mut libc::c_void,
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(LoadError::resolution_error(format!(
            "sysctl hw.ncpu failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    if ncpu < 0 {
        return Err(LoadError::resolution_error(format!("sysctl hw.ncpu returned {}", ncpu)));
    }
    Ok(ncpu as usize)
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "macos",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn kernel_cpu_count() -> Result<usize> {
    Err(LoadError::resolution_error(
        "no kernel CPU count interface on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSCPU_OUTPUT: &str = "\
# The following is the parsable format, which can be fed to other
# programs. Each different item in every column has an unique ID
# starting from zero.
# CPU,Core,Socket,Node,,L1d,L1i,L2,L3
0,0,0,0,,0,0,0,0
1,0,0,0,,0,0,0,0
2,1,0,0,,1,1,1,0
3,1,0,0,,1,1,1,0

";

    #[test]
    fn test_parse_lscpu_takes_last_id_plus_one() {
        let count = parse_lscpu(LSCPU_OUTPUT).unwrap();
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn test_parse_lscpu_rejects_header_only() {
        let result = parse_lscpu("# CPU,Core,Socket\n\n");
        assert!(matches!(result, Err(LoadError::Resolution(_))));
    }

    #[test]
    fn test_parse_lscpu_rejects_garbage() {
        assert!(parse_lscpu("cpu-a,0,0\n").is_err());
        assert!(parse_lscpu("").is_err());
    }

    #[test]
    fn test_parse_lscpu_rejects_max_id() {
        let output = format!("{},0,0\n", usize::MAX);
        assert!(matches!(parse_lscpu(&output), Err(LoadError::Resolution(_))));
    }

    #[test]
    fn test_missing_lscpu_binary_fails() {
        let resolver = LscpuResolver::with_program("/nonexistent/lscpu-for-tests");
        assert!(matches!(resolver.resolve(), Err(LoadError::Resolution(_))));
    }

    #[test]
    fn test_cpu_count_rejects_zero() {
        assert!(CpuCount::new(0).is_none());
        assert_eq!(CpuCount::new(8).map(CpuCount::get), Some(8));
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "freebsd"))]
    #[test]
    fn test_kernel_resolver_reports_cpus() {
        let count = KernelResolver.resolve().expect("kernel should report CPUs");
        assert!(count.get() > 0);
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&CpuStrategy::Kernel).unwrap();
        assert_eq!(json, "\"kernel\"");
    }
}
