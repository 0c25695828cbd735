use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Cumulative CPU time buckets from the aggregate `cpu` line, in clock ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Time spent idle or waiting on I/O
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Sum of all buckets, idle included
    pub fn total(&self) -> u64 {
        self.idle_total() + self.user + self.nice + self.system + self.irq + self.softirq + self.steal
    }
}

/// Raw `/proc/meminfo` values, converted to bytes. Optional labels default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub shmem: u64,
    pub sreclaimable: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// One mounted filesystem from the mount table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// Capacity figures of a mounted filesystem, in blocks of `block_size` bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsSpace {
    pub block_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
}

impl FsSpace {
    pub fn total_bytes(&self) -> u64 {
        self.blocks.saturating_mul(self.block_size)
    }

    pub fn free_bytes(&self) -> u64 {
        self.blocks_free.saturating_mul(self.block_size)
    }

    pub fn available_bytes(&self) -> u64 {
        self.blocks_available.saturating_mul(self.block_size)
    }
}

/// Per-device counters from `/proc/diskstats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskIoCounters {
    pub reads_completed: u64,
    pub writes_completed: u64,
    pub io_in_progress: u64,
}

/// Per-interface counters from `/proc/net/dev`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_drops: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_drops: u64,
}

/// Read-only access to the host's cumulative counters.
///
/// Implementations hold no sampling state; every call reflects the counters at
/// the time of the call. Errors are `SourceUnavailable` when the source cannot
/// be opened and `MalformedRecord` when a required record does not parse.
pub trait CounterSource: Send {
    fn cpu_times(&self) -> Result<CpuTimes>;

    /// First `model name` entry, `None` when the source has none or is unreadable
    fn cpu_model(&self) -> Option<String>;

    fn online_cores(&self) -> usize;

    fn meminfo(&self) -> Result<MemInfo>;

    fn mounts(&self) -> Result<Vec<MountEntry>>;

    fn filesystem_space(&self, mount_point: &Path) -> Result<FsSpace>;

    /// Counters keyed by kernel device name (`sda`, `nvme0n1`, ...)
    fn disk_io(&self) -> Result<HashMap<String, DiskIoCounters>>;

    /// Well-formed interface records, in source order
    fn interfaces(&self) -> Result<Vec<InterfaceCounters>>;
}
