use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, eyre};
use sysinfo::{Disks, Networks, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use super::network::NetworkCounters;
use super::platform::{FilesystemSpace, filesystem_space};
use super::process::RawProcess;
use crate::format::percent_of;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MemoryUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

impl DiskUsage {
    /// Used space excludes the root reserve; the percentage is taken over
    /// what unprivileged users can reach (`used + available`), as `df` does.
    pub fn from_space(space: FilesystemSpace) -> Self {
        let used_bytes = space.total_bytes.saturating_sub(space.free_bytes);
        DiskUsage {
            total_bytes: space.total_bytes,
            used_bytes,
            used_percent: percent_of(used_bytes, used_bytes.saturating_add(space.available_bytes)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub mount_point: PathBuf,
    pub filesystem_type: String,
}

/// Source of raw OS counters. Every domain is queried on its own and may
/// fail without affecting the others.
pub trait MetricsProvider: Send {
    /// Utilisation across all logical CPUs since the previous call.
    fn cpu_usage(&mut self) -> Result<f64>;
    fn cpu_model(&mut self) -> Result<String>;
    fn physical_cores(&mut self) -> Result<usize>;
    fn logical_threads(&mut self) -> Result<usize>;
    fn memory(&mut self) -> Result<MemoryUsage>;
    fn root_disk_usage(&mut self) -> Result<DiskUsage>;
    fn partitions(&mut self) -> Result<Vec<Partition>>;
    fn network_counters(&mut self) -> Result<NetworkCounters>;
    fn processes(&mut self) -> Result<Vec<RawProcess>>;
}

const ROOT_MOUNT: &str = "/";

/// Production provider backed by `sysinfo`. The `System` lives as long as
/// the provider so CPU usage is computed against the previous refresh.
pub struct SysinfoProvider {
    sys: System,
    disks: Disks,
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        SysinfoProvider {
            sys,
            disks: Disks::new(),
        }
    }
}

impl MetricsProvider for SysinfoProvider {
    fn cpu_usage(&mut self) -> Result<f64> {
        self.sys.refresh_cpu_usage();
        if self.sys.cpus().is_empty() {
            return Err(eyre!("no CPUs reported"));
        }
        Ok(f64::from(self.sys.global_cpu_usage()))
    }

    fn cpu_model(&mut self) -> Result<String> {
        self.sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .ok_or_else(|| eyre!("no CPU info reported"))
    }

    fn physical_cores(&mut self) -> Result<usize> {
        System::physical_core_count().ok_or_else(|| eyre!("physical core count unavailable"))
    }

    fn logical_threads(&mut self) -> Result<usize> {
        match self.sys.cpus().len() {
            0 => Err(eyre!("no logical CPUs reported")),
            n => Ok(n),
        }
    }

    fn memory(&mut self) -> Result<MemoryUsage> {
        self.sys.refresh_memory();
        let total_bytes = self.sys.total_memory();
        if total_bytes == 0 {
            return Err(eyre!("total memory reported as zero"));
        }
        let used_bytes = self.sys.used_memory();
        Ok(MemoryUsage {
            total_bytes,
            used_bytes,
            used_percent: percent_of(used_bytes, total_bytes),
        })
    }

    fn root_disk_usage(&mut self) -> Result<DiskUsage> {
        match filesystem_space(Path::new(ROOT_MOUNT)) {
            Ok(space) => Ok(DiskUsage::from_space(space)),
            Err(err) => {
                debug!("statvfs({ROOT_MOUNT}) failed, using the disk list: {err}");
                self.disks.refresh(true);
                let root = self
                    .disks
                    .list()
                    .iter()
                    .find(|disk| disk.mount_point() == Path::new(ROOT_MOUNT))
                    .ok_or_else(|| eyre!("no disk mounted at {ROOT_MOUNT}"))?;
                // The disk list has no free-block count, so the reserve
                // counts as used here.
                Ok(DiskUsage::from_space(FilesystemSpace {
                    total_bytes: root.total_space(),
                    free_bytes: root.available_space(),
                    available_bytes: root.available_space(),
                }))
            }
        }
    }

    fn partitions(&mut self) -> Result<Vec<Partition>> {
        self.disks.refresh(true);
        Ok(self
            .disks
            .list()
            .iter()
            .map(|disk| Partition {
                mount_point: disk.mount_point().to_path_buf(),
                filesystem_type: disk.file_system().to_string_lossy().to_string(),
            })
            .collect())
    }

    fn network_counters(&mut self) -> Result<NetworkCounters> {
        let networks = Networks::new_with_refreshed_list();
        if networks.list().is_empty() {
            return Err(eyre!("no network interfaces reported"));
        }
        Ok(networks
            .list()
            .values()
            .fold(NetworkCounters::default(), |acc, data| NetworkCounters {
                bytes_received: acc.bytes_received.saturating_add(data.total_received()),
                bytes_sent: acc.bytes_sent.saturating_add(data.total_transmitted()),
            }))
    }

    fn processes(&mut self) -> Result<Vec<RawProcess>> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let total_memory = self.sys.total_memory();

        let mut processes: Vec<RawProcess> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                let name = process.name().to_string_lossy().to_string();
                RawProcess {
                    pid: pid.as_u32(),
                    name: (!name.is_empty()).then_some(name),
                    cpu_percent: Some(f64::from(process.cpu_usage())),
                    memory_percent: (total_memory > 0)
                        .then(|| percent_of(process.memory(), total_memory)),
                    memory_resident_bytes: Some(process.memory()),
                }
            })
            .collect();

        if processes.is_empty() {
            return Err(eyre!("process table is empty"));
        }
        processes.sort_unstable_by_key(|p| p.pid);
        Ok(processes)
    }
}
