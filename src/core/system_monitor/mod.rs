//! Host telemetry sampling.
//!
//! Converts the kernel's cumulative counters into per-interval rates and
//! percentages for CPU, memory, disks, network interfaces and GPUs.

mod collector;
mod cpu;
mod disk;
mod gpu;
mod memory;
mod metrics;
mod network;
pub mod source;
mod store;

pub use collector::MetricsCollector;
pub use cpu::{usage_between, CpuSampler};
pub use disk::{base_device_name, disk_usage_percent, DiskSampler, DEFAULT_DENYLIST};
pub use gpu::{BackendKind, GpuBackend, GpuMonitor};
pub use memory::sample_memory;
pub use metrics::{
    percentage, BoundedList, CpuMetrics, DiskMetrics, GpuMetrics, GpuVendor, MemoryMetrics,
    MetricsSnapshot, NetworkMetrics, MAX_DISKS, MAX_GPUS, MAX_INTERFACES,
};
pub use network::{throughput, NetworkSampler};
pub use source::CounterSource;
pub use store::{counter_delta, DiskIoBaseline, EntityStore, InterfaceBaseline, SampleStore};
