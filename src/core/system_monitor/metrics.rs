use serde::{Deserialize, Serialize};
use std::ops::Deref;

use super::gpu::BackendKind;

/// Maximum number of mounted filesystems reported per snapshot
pub const MAX_DISKS: usize = 8;
/// Maximum number of GPUs reported per snapshot
pub const MAX_GPUS: usize = 4;
/// Maximum number of network interfaces reported per snapshot
pub const MAX_INTERFACES: usize = 16;

/// Complete result of one poll cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: i64, // Unix timestamp
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disks: BoundedList<DiskMetrics>,
    pub network: BoundedList<NetworkMetrics>,
    pub gpus: BoundedList<GpuMetrics>,
    pub gpu_backend: BackendKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuMetrics {
    pub usage_percent: f64,
    pub core_count: usize,
    pub model_name: String,
}

/// Memory figures in bytes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryMetrics {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub buffers_bytes: u64,
    /// Page cache plus reclaimable slab, minus shared memory
    pub cached_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_free_bytes: u64,
    pub swap_used_bytes: u64,
    pub usage_percent: f64,
    pub swap_percent: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskMetrics {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
    /// Read I/Os completed since the previous poll
    pub reads: u64,
    /// Write I/Os completed since the previous poll
    pub writes: u64,
    pub io_in_progress: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkMetrics {
    pub interface: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub errors_in: u64,
    pub errors_out: u64,
    pub drops_in: u64,
    pub drops_out: u64,
    /// Bytes per second
    pub receive_speed: f64,
    /// Bytes per second
    pub send_speed: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GpuMetrics {
    pub index: u32,
    pub vendor: GpuVendor,
    pub name: String,
    pub temperature_celsius: u32,
    pub utilization_percent: f64,
    pub memory_total_bytes: u64,
    pub memory_used_bytes: u64,
    pub memory_free_bytes: u64,
    pub power_usage_mw: u32,
    pub fan_speed_percent: u32,
    /// Only `name` is meaningful when false
    pub supported: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    #[default]
    Unknown,
}

impl GpuVendor {
    /// Map a PCI vendor id such as `0x10de` to a vendor
    pub fn from_pci_id(id: &str) -> Self {
        let digits = id.trim().trim_start_matches("0x").trim_start_matches("0X");
        match u16::from_str_radix(digits, 16) {
            Ok(0x10de) => GpuVendor::Nvidia,
            Ok(0x1002) => GpuVendor::Amd,
            Ok(0x8086) => GpuVendor::Intel,
            _ => GpuVendor::Unknown,
        }
    }
}

/// Ordered list that holds at most `capacity` entries.
///
/// Entries offered past the capacity are dropped and the list is flagged as
/// `truncated` so consumers can tell a full host from a cut-off enumeration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundedList<T> {
    items: Vec<T>,
    capacity: usize,
    truncated: bool,
}

impl<T> BoundedList<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    /// Append an entry, returning false (and marking truncation) when full
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            self.truncated = true;
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn mark_truncated(&mut self) {
        self.truncated = true;
    }
}

impl<T> Deref for BoundedList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a BoundedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// `100 * part / whole`, clamped to `[0, 100]`; zero when `whole` is zero
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 || !part.is_finite() || !whole.is_finite() {
        return 0.0;
    }
    (100.0 * part / whole).clamp(0.0, 100.0)
}
