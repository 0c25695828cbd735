use hostmon::core::system_monitor::CounterSource;
use hostmon::error::MonitorError;
use hostmon::platform::ProcfsSource;
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_reads_counters_from_proc_root() {
    let proc_dir = TempDir::new().unwrap();
    write(&proc_dir, "stat", "cpu  10 0 5 80 5 0 0 0 0 0\n");
    write(&proc_dir, "cpuinfo", "model name\t: Fake CPU\n");
    write(&proc_dir, "meminfo", "MemTotal: 2048 kB\nMemFree: 1024 kB\n");
    write(
        &proc_dir,
        "diskstats",
        "   8       0 sda 10 0 0 0 20 0 0 0 1 0 0 0 0 0 0\n",
    );
    write(
        &proc_dir,
        "net/dev",
        "header\nheader\n  eth0: 100 1 0 0 0 0 0 0 200 2 0 0 0 0 0 0\n",
    );

    let source = ProcfsSource::new(proc_dir.path(), proc_dir.path().join("mtab"));

    let times = source.cpu_times().unwrap();
    assert_eq!(times.total(), 100);
    assert_eq!(times.idle_total(), 85);
    assert_eq!(source.cpu_model().as_deref(), Some("Fake CPU"));
    assert_eq!(source.meminfo().unwrap().total, 2048 * 1024);
    assert_eq!(source.disk_io().unwrap()["sda"].writes_completed, 20);
    assert_eq!(source.interfaces().unwrap()[0].tx_bytes, 200);
}

#[test]
fn test_missing_files_are_unavailable() {
    let proc_dir = TempDir::new().unwrap();
    let source = ProcfsSource::new(proc_dir.path(), proc_dir.path().join("mtab"));

    assert!(matches!(
        source.meminfo(),
        Err(MonitorError::SourceUnavailable { .. })
    ));
    assert!(matches!(
        source.interfaces(),
        Err(MonitorError::SourceUnavailable { .. })
    ));
    assert!(matches!(
        source.mounts(),
        Err(MonitorError::SourceUnavailable { .. })
    ));
}

#[test]
fn test_malformed_cpu_line() {
    let proc_dir = TempDir::new().unwrap();
    write(&proc_dir, "stat", "intr 1 2 3\n");
    let source = ProcfsSource::new(proc_dir.path(), proc_dir.path().join("mtab"));

    assert!(matches!(
        source.cpu_times(),
        Err(MonitorError::MalformedRecord { .. })
    ));
}
