use hostmon::core::config::Config;
use hostmon::core::system_monitor::{BackendKind, GpuVendor, MetricsCollector, MetricsSnapshot};
use hostmon::error::Subsystem;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Fake procfs and sysfs trees plus a mount table pointing at a real directory
struct FakeHost {
    proc_dir: TempDir,
    sys_dir: TempDir,
    mount_dir: TempDir,
}

impl FakeHost {
    fn new() -> Self {
        let host = Self {
            proc_dir: TempDir::new().unwrap(),
            sys_dir: TempDir::new().unwrap(),
            mount_dir: TempDir::new().unwrap(),
        };

        host.write_proc("cpuinfo", "processor\t: 0\nmodel name\t: Fake CPU 3000\n");
        host.write_proc(
            "meminfo",
            "MemTotal:       8000 kB\nMemFree:        2000 kB\nMemAvailable:   5000 kB\n\
             Buffers:         500 kB\nCached:         1500 kB\nSwapTotal:      1000 kB\n\
             SwapFree:        1000 kB\n",
        );

        let mtab = format!(
            "/dev/sda1 {} ext4 rw,relatime 0 0\n\
             proc /proc proc rw 0 0\n\
             tmpfs /run tmpfs rw 0 0\n\
             /dev/loop0 /snap/core squashfs ro 0 0\n",
            host.mount_dir.path().display()
        );
        fs::write(host.mtab_path(), mtab).unwrap();

        let card = host.sys_dir.path().join("class/drm/card0/device");
        fs::create_dir_all(&card).unwrap();
        fs::write(card.join("vendor"), "0x1002\n").unwrap();
        fs::write(card.join("product"), "Fake Radeon\n").unwrap();

        host.set_counters(100, 200, 1000, 10);
        host
    }

    fn mtab_path(&self) -> std::path::PathBuf {
        self.proc_dir.path().join("mtab")
    }

    fn write_proc(&self, name: &str, content: &str) {
        let path = self.proc_dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Rewrite the cumulative counters: CPU idle/total ticks, eth0 rx bytes, sda reads
    fn set_counters(&self, idle: u64, total: u64, rx_bytes: u64, reads: u64) {
        self.write_proc(
            "stat",
            &format!("cpu  {} 0 0 {} 0 0 0 0 0 0\ncpu0 0 0 0 0 0 0 0 0\n", total - idle, idle),
        );
        self.write_proc(
            "net/dev",
            &format!(
                "Inter-|   Receive |  Transmit\n face |bytes packets|bytes packets\n  \
                 eth0: {} 10 0 0 0 0 0 0 500 5 0 0 0 0 0 0\n",
                rx_bytes
            ),
        );
        self.write_proc(
            "diskstats",
            &format!(
                "   7       0 loop0 5 0 0 0 5 0 0 0 0 0 0 0 0 0 0\n   \
                    8       0 sda {} 0 0 0 40 0 0 0 2 0 0 0 0 0 0\n   \
                    8       1 sda1 {} 0 0 0 40 0 0 0 0 0 0 0 0 0 0\n",
                reads, reads
            ),
        );
    }

    fn config(&self) -> Config {
        Config {
            proc_root: self.proc_dir.path().to_path_buf(),
            sys_root: self.sys_dir.path().to_path_buf(),
            mounts_file: self.mtab_path(),
            nvml_libraries: vec!["libhostmon-test-missing.so".to_string()],
            ..Config::default()
        }
    }
}

fn collect_pair(host: &FakeHost, collector: &mut MetricsCollector) -> MetricsSnapshot {
    let t0 = Instant::now();
    collector.collect_at(t0).unwrap();
    host.set_counters(150, 300, 3000, 25);
    collector.collect_at(t0 + Duration::from_secs(2)).unwrap()
}

#[test]
fn test_first_snapshot_has_zero_rates() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());

    let snapshot = collector.collect().unwrap();
    assert_eq!(snapshot.cpu.usage_percent, 0.0);
    assert_eq!(snapshot.cpu.model_name, "Fake CPU 3000");
    assert!(snapshot.cpu.core_count >= 1);
    assert_eq!(snapshot.network[0].receive_speed, 0.0);
    assert_eq!(snapshot.disks[0].reads, 0);
}

#[test]
fn test_second_snapshot_reports_deltas() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());

    let snapshot = collect_pair(&host, &mut collector);

    assert!((snapshot.cpu.usage_percent - 50.0).abs() < 1e-9);
    assert!((snapshot.network[0].receive_speed - 1000.0).abs() < 1e-9);
    assert_eq!(snapshot.network[0].send_speed, 0.0);
    assert_eq!(snapshot.disks[0].reads, 15);
    assert_eq!(snapshot.disks[0].writes, 0);
    assert_eq!(snapshot.disks[0].io_in_progress, 2);
}

#[test]
fn test_only_real_disks_are_reported() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());

    let snapshot = collector.collect().unwrap();
    assert_eq!(snapshot.disks.len(), 1);
    let disk = &snapshot.disks[0];
    assert_eq!(disk.device, "/dev/sda1");
    assert_eq!(Path::new(&disk.mount_point), host.mount_dir.path());
    assert_eq!(disk.fs_type, "ext4");
    assert!(disk.total_bytes > 0);
    assert!((0.0..=100.0).contains(&disk.usage_percent));
    assert!(!snapshot.disks.truncated());
}

#[test]
fn test_memory_figures() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());

    let memory = collector.collect().unwrap().memory;
    assert_eq!(memory.total_bytes, 8000 * 1024);
    assert_eq!(memory.used_bytes, 4000 * 1024);
    assert!((memory.usage_percent - 50.0).abs() < 1e-9);
    assert_eq!(memory.swap_percent, 0.0);
}

#[test]
fn test_gpu_falls_back_to_sysfs() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());
    assert_eq!(collector.gpu_backend(), BackendKind::Fallback);

    let snapshot = collector.collect().unwrap();
    assert_eq!(snapshot.gpu_backend, BackendKind::Fallback);
    assert_eq!(snapshot.gpus.len(), 1);
    let gpu = &snapshot.gpus[0];
    assert_eq!(gpu.name, "Fake Radeon");
    assert_eq!(gpu.vendor, GpuVendor::Amd);
    assert!(!gpu.supported);
    assert_eq!(gpu.utilization_percent, 0.0);
    assert_eq!(gpu.memory_used_bytes, 0);

    collector.shutdown();
    collector.shutdown();
}

#[test]
fn test_missing_source_aborts_cycle_with_subsystem() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());
    fs::remove_file(host.proc_dir.path().join("net/dev")).unwrap();

    let err = collector.collect().unwrap_err();
    assert_eq!(err.failed_subsystem(), Some(Subsystem::Network));
    assert!(err.to_string().starts_with("network"));
}

#[test]
fn test_missing_diskstats_is_not_fatal() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());
    fs::remove_file(host.proc_dir.path().join("diskstats")).unwrap();

    let snapshot = collector.collect().unwrap();
    assert_eq!(snapshot.disks.len(), 1);
    assert_eq!(snapshot.disks[0].reads, 0);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let host = FakeHost::new();
    let mut collector = MetricsCollector::new(&host.config());
    let snapshot = collect_pair(&host, &mut collector);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["gpu_backend"], "fallback");
    assert_eq!(json["network"]["truncated"], false);
    assert_eq!(json["cpu"]["model_name"], "Fake CPU 3000");
}
