use std::time::Instant;

use crate::core::config::Config;
use crate::error::{MonitorError, Result, Subsystem};
use crate::platform::gpu::select_gpu_backend;
use crate::platform::procfs::ProcfsSource;

use super::cpu::CpuSampler;
use super::disk::DiskSampler;
use super::gpu::{BackendKind, GpuMonitor};
use super::memory::sample_memory;
use super::metrics::MetricsSnapshot;
use super::network::NetworkSampler;
use super::source::CounterSource;
use super::store::SampleStore;

/// Collects one snapshot per call from the host's counters.
///
/// Owns the previous-sample state and the GPU backend. Calls must not overlap;
/// one cycle completes before the next begins.
pub struct MetricsCollector {
    source: Box<dyn CounterSource>,
    store: SampleStore,
    cpu: CpuSampler,
    disks: DiskSampler,
    network: NetworkSampler,
    gpu: GpuMonitor,
}

impl MetricsCollector {
    /// Create a collector reading the live host as described by `config`.
    ///
    /// Binds the GPU backend once; a missing vendor library is not an error.
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            Box::new(ProcfsSource::from_config(config)),
            DiskSampler::new(config.disk_denylist.clone()),
            select_gpu_backend(config),
        )
    }

    pub fn with_parts(
        source: Box<dyn CounterSource>,
        disks: DiskSampler,
        gpu: GpuMonitor,
    ) -> Self {
        Self {
            source,
            store: SampleStore::new(),
            cpu: CpuSampler::new(),
            disks,
            network: NetworkSampler::new(),
            gpu,
        }
    }

    pub fn gpu_backend(&self) -> BackendKind {
        self.gpu.kind()
    }

    /// Sample every subsystem now
    pub fn collect(&mut self) -> Result<MetricsSnapshot> {
        self.collect_at(Instant::now())
    }

    /// Sample every subsystem, treating `now` as the time of the reading.
    ///
    /// Subsystems run in the order CPU, memory, disk, network, GPU. The first
    /// failure ends the cycle with `MonitorError::Partial` naming the subsystem;
    /// later subsystems are not sampled.
    pub fn collect_at(&mut self, now: Instant) -> Result<MetricsSnapshot> {
        let source = self.source.as_ref();

        let cpu = self
            .cpu
            .sample(source, &mut self.store.cpu)
            .map_err(|e| MonitorError::partial(Subsystem::Cpu, e))?;

        let memory =
            sample_memory(source).map_err(|e| MonitorError::partial(Subsystem::Memory, e))?;

        let disks = self
            .disks
            .sample(source, &mut self.store.disks)
            .map_err(|e| MonitorError::partial(Subsystem::Disk, e))?;

        let network = self
            .network
            .sample(source, &mut self.store.network, now)
            .map_err(|e| MonitorError::partial(Subsystem::Network, e))?;

        let gpus = self
            .gpu
            .collect()
            .map_err(|e| MonitorError::partial(Subsystem::Gpu, e))?;

        Ok(MetricsSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            cpu,
            memory,
            disks,
            network,
            gpus,
            gpu_backend: self.gpu.kind(),
        })
    }

    /// Release the GPU backend. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.gpu.shutdown();
    }
}
