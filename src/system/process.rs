use serde::Serialize;

use crate::format::round_2;

/// Number of processes kept in a snapshot unless configured otherwise.
pub const DEFAULT_PROCESS_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_resident_bytes: u64,
}

/// One row of the OS process table as reported by a provider. Every
/// attribute apart from the PID may be unreadable for short-lived or
/// privileged processes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: Option<String>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub memory_resident_bytes: Option<u64>,
}

impl ProcessSample {
    /// Processes whose name could not be read are dropped.
    pub fn from_raw(raw: RawProcess) -> Option<Self> {
        let name = raw.name?;
        Some(ProcessSample {
            pid: raw.pid,
            name,
            cpu_percent: round_2(raw.cpu_percent.unwrap_or(0.0)),
            memory_percent: round_2(raw.memory_percent.unwrap_or(0.0)),
            memory_resident_bytes: raw.memory_resident_bytes.unwrap_or(0),
        })
    }
}

/// Sort by CPU usage descending and keep the first `limit` entries.
/// The sort is stable: ties keep their enumeration order.
pub fn rank_processes(mut processes: Vec<ProcessSample>, limit: usize) -> Vec<ProcessSample> {
    processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    processes.truncate(limit);
    processes
}

pub fn samples_from_raw(raw: Vec<RawProcess>, limit: usize) -> Vec<ProcessSample> {
    let samples = raw.into_iter().filter_map(ProcessSample::from_raw).collect();
    rank_processes(samples, limit)
}
