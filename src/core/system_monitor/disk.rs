//! Disk space and I/O sampling.
//!
//! Mounts are rediscovered every cycle. I/O baselines are keyed by the base
//! block device (`sda` for `/dev/sda2`), so a reordered mount table never
//! applies one device's counters to another.

use std::collections::HashMap;
use std::path::Path;

use super::metrics::{percentage, BoundedList, DiskMetrics, MAX_DISKS};
use super::source::{CounterSource, DiskIoCounters};
use super::store::{counter_delta, DiskIoBaseline, EntityStore};
use crate::error::Result;

/// Device name fragments that mark virtual block devices
pub const DEFAULT_DENYLIST: [&str; 4] = ["loop", "ram", "dm-", "sr"];

pub struct DiskSampler {
    denylist: Vec<String>,
    capacity: usize,
}

impl Default for DiskSampler {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect())
    }
}

impl DiskSampler {
    pub fn new(denylist: Vec<String>) -> Self {
        Self::with_capacity(denylist, MAX_DISKS)
    }

    pub fn with_capacity(denylist: Vec<String>, capacity: usize) -> Self {
        Self { denylist, capacity }
    }

    /// Whether a mount source names a physical block device
    pub fn is_real_disk(&self, device: &str) -> bool {
        // proc, sysfs, tmpfs and friends have no device path
        device.starts_with('/') && !self.denylist.iter().any(|d| device.contains(d.as_str()))
    }

    /// Sample every real mounted filesystem.
    ///
    /// Fails only when the mount table cannot be read. A missing I/O source
    /// leaves every disk at zero I/O, and a mount whose capacity cannot be
    /// queried is skipped.
    pub fn sample(
        &self,
        source: &dyn CounterSource,
        store: &mut EntityStore<DiskIoBaseline>,
    ) -> Result<BoundedList<DiskMetrics>> {
        let mounts = source.mounts()?;
        let io = source.disk_io().unwrap_or_else(|e| {
            log::warn!("Disk I/O counters unavailable, reporting zero I/O: {}", e);
            HashMap::new()
        });

        store.begin_cycle();
        // Partitions of one disk share its counters; advance each baseline once
        let mut cycle_deltas: HashMap<String, (u64, u64)> = HashMap::new();
        let mut disks = BoundedList::with_capacity(self.capacity);

        for mount in mounts.iter().filter(|m| self.is_real_disk(&m.device)) {
            let space = match source.filesystem_space(Path::new(&mount.mount_point)) {
                Ok(space) => space,
                Err(e) => {
                    log::debug!("Skipping {}: {}", mount.mount_point, e);
                    continue;
                }
            };

            if disks.is_full() {
                log::debug!(
                    "Disk limit of {} reached, skipping {}",
                    self.capacity,
                    mount.mount_point
                );
                disks.mark_truncated();
                break;
            }

            let mut disk = DiskMetrics {
                device: mount.device.clone(),
                mount_point: mount.mount_point.clone(),
                fs_type: mount.fs_type.clone(),
                total_bytes: space.total_bytes(),
                free_bytes: space.free_bytes(),
                available_bytes: space.available_bytes(),
                usage_percent: disk_usage_percent(space.blocks_available, space.blocks),
                ..Default::default()
            };

            let base = io_device_name(&mount.device, &io);
            if let Some(counters) = io.get(base) {
                let (reads, writes) = *cycle_deltas
                    .entry(base.to_string())
                    .or_insert_with(|| io_delta(store, base, counters));
                disk.reads = reads;
                disk.writes = writes;
                disk.io_in_progress = counters.io_in_progress;
            } else {
                log::debug!("No I/O counters for {} ({})", mount.device, base);
            }

            disks.push(disk);
        }

        Ok(disks)
    }
}

fn io_delta(
    store: &mut EntityStore<DiskIoBaseline>,
    base: &str,
    counters: &DiskIoCounters,
) -> (u64, u64) {
    let current = DiskIoBaseline {
        reads: counters.reads_completed,
        writes: counters.writes_completed,
    };
    match store.replace(base, current) {
        Some(previous) => (
            counter_delta(current.reads, previous.reads),
            counter_delta(current.writes, previous.writes),
        ),
        None => (0, 0),
    }
}

/// Share of the filesystem not available to unprivileged users
pub fn disk_usage_percent(available: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 - percentage(available as f64, total as f64)
}

/// Kernel name of the whole disk behind a partition device path.
///
/// `/dev/sda2` -> `sda`, `/dev/nvme0n1p3` -> `nvme0n1`, `/dev/mmcblk0p1` -> `mmcblk0`.
pub fn base_device_name(device: &str) -> &str {
    let name = device.rsplit('/').next().unwrap_or(device);
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.len() == name.len() {
        return name;
    }

    // Devices whose own name ends in a digit number partitions as `p<N>`
    if let Some(disk) = stem.strip_suffix('p') {
        if disk.ends_with(|c: char| c.is_ascii_digit()) {
            return disk;
        }
    }
    if stem.ends_with(|c: char| c.is_ascii_alphabetic()) && !is_numbered_disk(stem) {
        return stem;
    }
    name
}

/// Key of the diskstats record that carries a mount's I/O: the whole disk
/// when listed, else the device's own kernel name (`md0`, `nbd0`).
fn io_device_name<'a>(device: &'a str, io: &HashMap<String, DiskIoCounters>) -> &'a str {
    let base = base_device_name(device);
    if io.contains_key(base) {
        return base;
    }
    let name = device.rsplit('/').next().unwrap_or(device);
    if io.contains_key(name) {
        name
    } else {
        base
    }
}

/// Whole-disk names that end in an index (`nvme0n1`, `mmcblk0`) and have no partition suffix
fn is_numbered_disk(stem: &str) -> bool {
    stem.starts_with("nvme") || stem.starts_with("mmcblk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::system_monitor::source::stub::StubSource;
    use crate::core::system_monitor::source::{FsSpace, MountEntry};

    fn space(blocks: u64, available: u64) -> FsSpace {
        FsSpace {
            block_size: 4096,
            blocks,
            blocks_free: available,
            blocks_available: available,
        }
    }

    fn source_with_root() -> StubSource {
        let mut source = StubSource::default();
        source.add_mount("/dev/sda1", "/", space(1000, 250));
        source.set_disk_io("sda", 100, 50);
        source
    }

    #[test]
    fn test_usage_percentage() {
        assert!((disk_usage_percent(250, 1000) - 75.0).abs() < 1e-9);
        assert_eq!(disk_usage_percent(0, 0), 0.0);
        assert_eq!(disk_usage_percent(1000, 1000), 0.0);
    }

    #[test]
    fn test_base_device_name() {
        assert_eq!(base_device_name("/dev/sda1"), "sda");
        assert_eq!(base_device_name("/dev/sdb"), "sdb");
        assert_eq!(base_device_name("/dev/nvme0n1p2"), "nvme0n1");
        assert_eq!(base_device_name("/dev/nvme0n1"), "nvme0n1");
        assert_eq!(base_device_name("/dev/mmcblk0p1"), "mmcblk0");
        assert_eq!(base_device_name("/dev/mmcblk0"), "mmcblk0");
        assert_eq!(base_device_name("vda3"), "vda");
    }

    #[test]
    fn test_virtual_devices_are_filtered() {
        let sampler = DiskSampler::default();
        assert!(sampler.is_real_disk("/dev/sda1"));
        assert!(!sampler.is_real_disk("/dev/loop0"));
        assert!(!sampler.is_real_disk("/dev/dm-0"));
        assert!(!sampler.is_real_disk("/dev/sr0"));
        assert!(!sampler.is_real_disk("/dev/ram1"));
        assert!(!sampler.is_real_disk("tmpfs"));
        assert!(!sampler.is_real_disk("proc"));
    }

    #[test]
    fn test_first_appearance_reports_zero_io() {
        let source = source_with_root();
        let mut store = EntityStore::new();
        let disks = DiskSampler::default().sample(&source, &mut store).unwrap();

        assert_eq!(disks.len(), 1);
        assert!((disks[0].usage_percent - 75.0).abs() < 1e-9);
        assert_eq!(disks[0].total_bytes, 1000 * 4096);
        assert_eq!((disks[0].reads, disks[0].writes), (0, 0));
    }

    #[test]
    fn test_io_delta_between_polls() {
        let mut source = source_with_root();
        let sampler = DiskSampler::default();
        let mut store = EntityStore::new();
        sampler.sample(&source, &mut store).unwrap();

        source.set_disk_io("sda", 130, 70);
        let disks = sampler.sample(&source, &mut store).unwrap();
        assert_eq!((disks[0].reads, disks[0].writes), (30, 20));
    }

    #[test]
    fn test_counter_reset_clamps_to_zero() {
        let mut source = source_with_root();
        let sampler = DiskSampler::default();
        let mut store = EntityStore::new();
        sampler.sample(&source, &mut store).unwrap();

        source.set_disk_io("sda", 10, 5);
        let disks = sampler.sample(&source, &mut store).unwrap();
        assert_eq!((disks[0].reads, disks[0].writes), (0, 0));

        // the reset value is the new baseline
        source.set_disk_io("sda", 15, 9);
        let disks = sampler.sample(&source, &mut store).unwrap();
        assert_eq!((disks[0].reads, disks[0].writes), (5, 4));
    }

    #[test]
    fn test_reordered_mounts_keep_their_baselines() {
        let mut source = StubSource::default();
        source.add_mount("/dev/sda1", "/", space(100, 50));
        source.add_mount("/dev/sdb1", "/data", space(100, 50));
        source.set_disk_io("sda", 1000, 0);
        source.set_disk_io("sdb", 10, 0);
        let sampler = DiskSampler::default();
        let mut store = EntityStore::new();
        sampler.sample(&source, &mut store).unwrap();

        source.mounts.as_mut().unwrap().reverse();
        source.set_disk_io("sda", 1001, 0);
        source.set_disk_io("sdb", 12, 0);
        let disks = sampler.sample(&source, &mut store).unwrap();
        assert_eq!(disks[0].mount_point, "/data");
        assert_eq!(disks[0].reads, 2);
        assert_eq!(disks[1].reads, 1);
    }

    #[test]
    fn test_partitions_share_device_delta() {
        let mut source = StubSource::default();
        source.add_mount("/dev/sda1", "/", space(100, 50));
        source.add_mount("/dev/sda2", "/home", space(100, 50));
        source.set_disk_io("sda", 100, 100);
        let sampler = DiskSampler::default();
        let mut store = EntityStore::new();
        sampler.sample(&source, &mut store).unwrap();

        source.set_disk_io("sda", 110, 120);
        let disks = sampler.sample(&source, &mut store).unwrap();
        assert_eq!((disks[0].reads, disks[0].writes), (10, 20));
        assert_eq!((disks[1].reads, disks[1].writes), (10, 20));
    }

    #[test]
    fn test_missing_io_source_is_not_fatal() {
        let mut source = source_with_root();
        source.disk_io = None;
        let disks = DiskSampler::default()
            .sample(&source, &mut EntityStore::new())
            .unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!((disks[0].reads, disks[0].writes, disks[0].io_in_progress), (0, 0, 0));
    }

    #[test]
    fn test_missing_mount_table_fails() {
        let source = StubSource::default();
        assert!(DiskSampler::default()
            .sample(&source, &mut EntityStore::new())
            .is_err());
    }

    #[test]
    fn test_unqueryable_mount_is_skipped() {
        let mut source = source_with_root();
        source.mounts.as_mut().unwrap().push(MountEntry {
            device: "/dev/sdc1".to_string(),
            mount_point: "/gone".to_string(),
            fs_type: "ext4".to_string(),
        });
        let disks = DiskSampler::default()
            .sample(&source, &mut EntityStore::new())
            .unwrap();
        assert_eq!(disks.len(), 1);
    }

    #[test]
    fn test_indexed_whole_disk_reports_io() {
        let mut source = StubSource::default();
        source.add_mount("/dev/md0", "/raid", space(100, 50));
        source.set_disk_io("md0", 40, 10);
        let sampler = DiskSampler::default();
        let mut store = EntityStore::new();
        sampler.sample(&source, &mut store).unwrap();

        source.set_disk_io("md0", 45, 13);
        let disks = sampler.sample(&source, &mut store).unwrap();
        assert_eq!((disks[0].reads, disks[0].writes), (5, 3));
    }

    #[test]
    fn test_unqueryable_mount_after_full_list_is_not_truncation() {
        let mut source = StubSource::default();
        source.add_mount("/dev/sda1", "/", space(10, 5));
        source.add_mount("/dev/sdb1", "/b", space(10, 5));
        source.mounts.as_mut().unwrap().push(MountEntry {
            device: "/dev/sdc1".to_string(),
            mount_point: "/gone".to_string(),
            fs_type: "ext4".to_string(),
        });
        let denylist = DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect();
        let disks = DiskSampler::with_capacity(denylist, 2)
            .sample(&source, &mut EntityStore::new())
            .unwrap();
        assert_eq!(disks.len(), 2);
        assert!(!disks.truncated());
    }

    #[test]
    fn test_enumeration_is_bounded() {
        let mut source = StubSource::default();
        for (device, mount_point) in [("/dev/sda1", "/"), ("/dev/sdb1", "/b"), ("/dev/sdc1", "/c")] {
            source.add_mount(device, mount_point, space(10, 5));
        }
        let denylist = DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect();
        let disks = DiskSampler::with_capacity(denylist, 2)
            .sample(&source, &mut EntityStore::new())
            .unwrap();
        assert_eq!(disks.len(), 2);
        assert!(disks.truncated());
    }
}
