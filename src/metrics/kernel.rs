//! Kernel-call backend.
//!
//! Load averages come from the kernel as fixed-point integers together with
//! their scale factor; scheduling counts come from a process table snapshot.
//! The handle used for the process table is opened once and held for the
//! lifetime of the source.

use crate::error::{LoadError, Result};
use crate::metrics::data::{RawLoad, SchedulingCounts};
use crate::metrics::traits::LoadSource;
use sysinfo::{ProcessRefreshKind, ProcessStatus, RefreshKind, System};
use tracing::{debug, error};

/// Load averages in the kernel's fixed-point representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointLoad {
    pub ldavg: [u64; 3],
    /// Value representing 1.0
    pub fscale: u64,
}

impl FixedPointLoad {
    /// Convert to real-valued 1, 5 and 15 minute averages.
    pub fn to_averages(&self) -> Result<[f64; 3]> {
        if self.fscale == 0 {
            return Err(LoadError::format_error(
                "kernel reported a zero load scale",
                format!("{:?}", self),
            ));
        }
        let scale = self.fscale as f64;
        Ok(self.ldavg.map(|v| v as f64 / scale))
    }
}

/// Kernel counter queries backing [`KernelSource`].
#[cfg_attr(test, mockall::automock)]
pub trait KernelCounters: Send {
    fn load_average(&mut self) -> Result<FixedPointLoad>;
    fn scheduling_counts(&mut self) -> Result<SchedulingCounts>;
}

/// Load source querying kernel counters on every sample.
#[derive(Debug)]
pub struct KernelSource<K = SystemCounters> {
    counters: K,
}

impl KernelSource<SystemCounters> {
    /// Open the kernel info handle for this host.
    pub fn open() -> Result<Self> {
        Ok(Self::with_counters(SystemCounters::open()?))
    }
}

impl<K: KernelCounters> KernelSource<K> {
    pub fn with_counters(counters: K) -> Self {
        Self { counters }
    }
}

impl<K: KernelCounters> LoadSource for KernelSource<K> {
    const SOURCE_KIND: &'static str = "kernel";

    fn sample(&mut self) -> Result<RawLoad> {
        let fixed = self.counters.load_average().map_err(|e| {
            error!("Kernel load average query failed: {}", e);
            e
        })?;
        let [min1, min5, min15] = fixed.to_averages()?;
        let scheduling = self.counters.scheduling_counts()?;

        Ok(RawLoad {
            min1,
            min5,
            min15,
            scheduling,
        })
    }
}

/// Kernel counters of the running host.
pub struct SystemCounters {
    system: System,
}

impl std::fmt::Debug for SystemCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemCounters").finish_non_exhaustive()
    }
}

impl SystemCounters {
    pub fn open() -> Result<Self> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(LoadError::source_error(
                "process table is not available on this platform",
            ));
        }
        let system = System::new_with_specifics(process_refresh());
        debug!("Opened process table handle");
        Ok(Self { system })
    }
}

fn process_refresh() -> RefreshKind {
    RefreshKind::new().with_processes(ProcessRefreshKind::new())
}

impl KernelCounters for SystemCounters {
    fn load_average(&mut self) -> Result<FixedPointLoad> {
        read_fixed_load()
    }

    fn scheduling_counts(&mut self) -> Result<SchedulingCounts> {
        self.system.refresh_specifics(process_refresh());
        let processes = self.system.processes();
        let runnable = processes
            .values()
            .filter(|p| p.status() == ProcessStatus::Run)
            .count();

        Ok(SchedulingCounts {
            runnable: runnable as u64,
            existing: processes.len() as u64,
        })
    }
}

#[cfg(target_os = "linux")]
fn read_fixed_load() -> Result<FixedPointLoad> {
    // include/uapi/linux/sysinfo.h
    const SI_LOAD_SHIFT: u32 = 16;

    // SAFETY: sysinfo only writes into the zeroed struct we pass it.
    let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
    if unsafe { libc::sysinfo(&mut info) } != 0 {
        return Err(LoadError::source_error(format!(
            "sysinfo(2) failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    Ok(FixedPointLoad {
        ldavg: info.loads.map(|v| v as u64),
        fscale: 1 << SI_LOAD_SHIFT,
    })
}

#[cfg(any(
    target_os = "freebsd",
    target_os = "macos",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn read_fixed_load() -> Result<FixedPointLoad> {
    // struct loadavg from <sys/resource.h>
    #[repr(C)]
    struct LoadAvg {
        ldavg: [u32; 3],
        fscale: libc::c_long,
    }

    let mut load = LoadAvg {
        ldavg: [0; 3],
        fscale: 0,
    };
    let mut size = std::mem::size_of::<LoadAvg>();
    // SAFETY: the name is NUL-terminated and `size` matches the output buffer.
    let rc = unsafe {
        libc::sysctlbyname(
            b"vm.loadavg\0".as_ptr() as *const libc::c_char,
            &mut load as *mut LoadAvg as *mut libc::c_void,
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(LoadError::source_error(format!(
            "sysctl vm.loadavg failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    Ok(FixedPointLoad {
        ldavg: load.ldavg.map(u64::from),
        fscale: load.fscale.max(0) as u64,
    })
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "macos",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn read_fixed_load() -> Result<FixedPointLoad> {
    Err(LoadError::source_error(
        "no kernel load average interface on this platform",
    ))
}
