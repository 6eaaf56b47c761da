// src/status.rs

use sysinfo::{Pid, ProcessesToUpdate, System, get_current_pid};
use tracing::{info, warn};

/// Counters reported on every status tick and at shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub cached: usize,
    pub seen: usize,
    pub in_flight: usize,
    pub batches: usize,
    pub annotated: usize,
    pub failed_batches: usize,
}

/// Periodic status line with this process's resource usage.
pub struct StatusReporter {
    sys: System,
    pid: Option<Pid>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let pid = match get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                warn!(error = err, "Could not resolve current PID, resource usage disabled");
                None
            }
        };
        Self {
            sys: System::new(),
            pid,
        }
    }

    pub fn report(&mut self, counters: SessionCounters) {
        let usage = self.pid.and_then(|pid| {
            self.sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            self.sys
                .process(pid)
                .map(|process| (process.cpu_usage(), process.memory() / 1024))
        });

        match usage {
            Some((cpu, memory_kb)) => info!(
                cached = counters.cached,
                seen = counters.seen,
                in_flight = counters.in_flight,
                batches = counters.batches,
                annotated = counters.annotated,
                failed = counters.failed_batches,
                cpu = %format!("{cpu:.2}%"),
                memory_kb,
                "💻 Session status"
            ),
            None => info!(
                cached = counters.cached,
                seen = counters.seen,
                in_flight = counters.in_flight,
                batches = counters.batches,
                annotated = counters.annotated,
                failed = counters.failed_batches,
                "Session status"
            ),
        }
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
