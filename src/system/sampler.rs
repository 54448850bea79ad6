use std::path::Path;
use std::time::Instant;

use tracing::{debug, debug_span, warn};

use super::network::{self, NetworkCounterState};
use super::platform::{CachedMemoryType, MemoryTypeProbe, SystemInventoryProbe};
use super::process::{DEFAULT_PROCESS_LIMIT, samples_from_raw};
use super::provider::{MetricsProvider, SysinfoProvider};
use super::snapshot::SystemSnapshot;
use crate::format::{format_bytes, format_rate, round_2};

const ROOT_MOUNT: &str = "/";

/// Produces one [`SystemSnapshot`] per call. Owns the network baseline, the
/// only state that outlives a cycle.
pub struct Sampler<P = SysinfoProvider, M = CachedMemoryType<SystemInventoryProbe>> {
    provider: P,
    memory_probe: M,
    network: Option<NetworkCounterState>,
    process_limit: usize,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        Sampler::with_parts(
            SysinfoProvider::new(),
            CachedMemoryType::new(SystemInventoryProbe),
        )
    }
}

impl<P: MetricsProvider, M: MemoryTypeProbe> Sampler<P, M> {
    pub fn with_parts(provider: P, memory_probe: M) -> Self {
        Sampler {
            provider,
            memory_probe,
            network: None,
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }

    pub fn with_process_limit(mut self, limit: usize) -> Self {
        self.process_limit = limit;
        self
    }

    /// Start from a known network baseline instead of an empty one.
    pub fn with_network_state(mut self, state: NetworkCounterState) -> Self {
        self.network = Some(state);
        self
    }

    pub fn network_state(&self) -> Option<&NetworkCounterState> {
        self.network.as_ref()
    }

    pub fn collect(&mut self) -> SystemSnapshot {
        self.collect_at(Instant::now())
    }

    /// Sample every domain as of `now`. Never fails: a domain that errors
    /// is logged and leaves its fields at their zero values.
    pub fn collect_at(&mut self, now: Instant) -> SystemSnapshot {
        let _span = debug_span!("sampler.collect").entered();
        let mut snapshot = SystemSnapshot::default();

        self.collect_cpu(&mut snapshot);
        self.collect_memory(&mut snapshot);
        self.collect_disk(&mut snapshot);
        self.collect_network(&mut snapshot, now);
        self.collect_processes(&mut snapshot);

        debug!(
            cpu = snapshot.cpu_usage_percent,
            memory_used = %format_bytes(snapshot.memory_used_bytes),
            net_in = %format_rate(snapshot.network_in_rate_bytes_per_sec),
            net_out = %format_rate(snapshot.network_out_rate_bytes_per_sec),
            processes = snapshot.processes.len(),
            "sample complete"
        );
        snapshot
    }

    fn collect_cpu(&mut self, snapshot: &mut SystemSnapshot) {
        match self.provider.cpu_usage() {
            Ok(percent) => snapshot.cpu_usage_percent = round_2(percent),
            Err(err) => warn!("Error getting CPU percent: {err}"),
        }
        match self.provider.cpu_model() {
            Ok(model) => snapshot.cpu_model = model,
            Err(err) => debug!("CPU model unavailable: {err}"),
        }
        match self.provider.physical_cores() {
            Ok(cores) => snapshot.cpu_physical_cores = cores,
            Err(err) => debug!("Physical core count unavailable: {err}"),
        }
        match self.provider.logical_threads() {
            Ok(threads) => snapshot.cpu_logical_threads = threads,
            Err(err) => debug!("Logical thread count unavailable: {err}"),
        }
    }

    fn collect_memory(&mut self, snapshot: &mut SystemSnapshot) {
        match self.provider.memory() {
            Ok(memory) => {
                snapshot.memory_total_bytes = memory.total_bytes;
                snapshot.memory_used_bytes = memory.used_bytes;
                snapshot.memory_usage_percent = round_2(memory.used_percent);
            }
            Err(err) => warn!("Error getting memory stats: {err}"),
        }
        snapshot.memory_type = self.memory_probe.probe().label().to_string();
    }

    fn collect_disk(&mut self, snapshot: &mut SystemSnapshot) {
        match self.provider.root_disk_usage() {
            Ok(disk) => {
                snapshot.disk_total_bytes = disk.total_bytes;
                snapshot.disk_used_bytes = disk.used_bytes;
                snapshot.disk_usage_percent = round_2(disk.used_percent);
            }
            Err(err) => warn!("Error getting disk usage: {err}"),
        }
        match self.provider.partitions() {
            Ok(partitions) => {
                if let Some(root) = partitions
                    .into_iter()
                    .find(|p| p.mount_point == Path::new(ROOT_MOUNT))
                {
                    snapshot.disk_filesystem_type = root.filesystem_type;
                }
            }
            Err(err) => debug!("Partition list unavailable: {err}"),
        }
    }

    fn collect_network(&mut self, snapshot: &mut SystemSnapshot, now: Instant) {
        // On failure the previous baseline is kept so the next cycle still
        // measures across a valid interval.
        match self.provider.network_counters() {
            Ok(counters) => {
                let rates = network::advance(&mut self.network, counters, now);
                snapshot.network_in_rate_bytes_per_sec = rates.in_bytes_per_sec;
                snapshot.network_out_rate_bytes_per_sec = rates.out_bytes_per_sec;
            }
            Err(err) => warn!("Error getting net stats: {err}"),
        }
    }

    fn collect_processes(&mut self, snapshot: &mut SystemSnapshot) {
        match self.provider.processes() {
            Ok(raw) => snapshot.processes = samples_from_raw(raw, self.process_limit),
            Err(err) => warn!("Error getting processes: {err}"),
        }
    }
}
