//! Resource Monitor
//!
//! Point-in-time memory / CPU sample of the router process itself.
//! Sử dụng sysinfo crate, refreshing only our own PID so a sample stays cheap.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

/// One sample attached to a decision record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Resident memory (MB)
    pub memory_mb: f64,
    /// CPU usage since the previous sample; None on the first sample
    pub cpu_percent: Option<f32>,
}

/// Source of resource samples
pub trait ResourceSampler: Send {
    fn sample(&mut self) -> ResourceSample;
}

/// sysinfo-backed monitor for the current process
pub struct ProcessMonitor {
    sys: System,
    pid: Option<Pid>,
    samples: u64,
}

impl ProcessMonitor {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("Resource monitor disabled: {}", e);
                None
            }
        };

        Self {
            sys: System::new(),
            pid,
            samples: 0,
        }
    }
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for ProcessMonitor {
    fn sample(&mut self) -> ResourceSample {
        let Some(pid) = self.pid else {
            return ResourceSample::default();
        };

        if !self.sys.refresh_process(pid) {
            return ResourceSample::default();
        }

        let first = self.samples == 0;
        self.samples += 1;

        match self.sys.process(pid) {
            Some(process) => ResourceSample {
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
                // No previous interval to measure against yet
                cpu_percent: if first { None } else { Some(process.cpu_usage()) },
            },
            None => ResourceSample::default(),
        }
    }
}

/// Fixed sample (tests, environments without process info)
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSampler(pub ResourceSample);

impl ResourceSampler for StaticSampler {
    fn sample(&mut self) -> ResourceSample {
        self.0
    }
}
