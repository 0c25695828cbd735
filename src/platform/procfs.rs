//! Counter source backed by procfs and the mount table.
//!
//! Parsing is kept in free functions over the file contents so it can be
//! tested without a live `/proc`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::system_monitor::source::{
    CounterSource, CpuTimes, DiskIoCounters, FsSpace, InterfaceCounters, MemInfo, MountEntry,
};
use crate::error::{MonitorError, Result};

/// Reads the live host's counters
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    proc_root: PathBuf,
    mounts_file: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new("/proc", "/etc/mtab")
    }
}

impl ProcfsSource {
    pub fn new<P: Into<PathBuf>, M: Into<PathBuf>>(proc_root: P, mounts_file: M) -> Self {
        Self {
            proc_root: proc_root.into(),
            mounts_file: mounts_file.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.proc_root.clone(), config.mounts_file.clone())
    }

    fn read_proc(&self, name: &str) -> Result<(PathBuf, String)> {
        let path = self.proc_root.join(name);
        read_source(&path).map(|content| (path, content))
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| MonitorError::source_unavailable(path, e))
}

impl CounterSource for ProcfsSource {
    fn cpu_times(&self) -> Result<CpuTimes> {
        let (path, content) = self.read_proc("stat")?;
        parse_cpu_times(&content, &path.display().to_string())
    }

    fn cpu_model(&self) -> Option<String> {
        match self.read_proc("cpuinfo") {
            Ok((_, content)) => parse_cpu_model(&content),
            Err(e) => {
                log::debug!("CPU model unavailable: {}", e);
                None
            }
        }
    }

    fn online_cores(&self) -> usize {
        online_cores()
    }

    fn meminfo(&self) -> Result<MemInfo> {
        let (path, content) = self.read_proc("meminfo")?;
        parse_meminfo(&content, &path.display().to_string())
    }

    fn mounts(&self) -> Result<Vec<MountEntry>> {
        let content = read_source(&self.mounts_file)?;
        Ok(parse_mounts(&content))
    }

    fn filesystem_space(&self, mount_point: &Path) -> Result<FsSpace> {
        statvfs(mount_point)
    }

    fn disk_io(&self) -> Result<HashMap<String, DiskIoCounters>> {
        let (_, content) = self.read_proc("diskstats")?;
        Ok(parse_diskstats(&content))
    }

    fn interfaces(&self) -> Result<Vec<InterfaceCounters>> {
        let (_, content) = self.read_proc("net/dev")?;
        Ok(parse_net_dev(&content))
    }
}

/// Parse the aggregate `cpu` line, which must be the first line
pub fn parse_cpu_times(content: &str, origin: &str) -> Result<CpuTimes> {
    let line = content
        .lines()
        .next()
        .ok_or_else(|| MonitorError::malformed(origin, "empty file"))?;

    let mut parts = line.split_whitespace();
    if parts.next() != Some("cpu") {
        return Err(MonitorError::malformed(
            origin,
            format!("expected aggregate cpu line, got {:?}", line),
        ));
    }

    let mut values = [0u64; 8];
    for (i, slot) in values.iter_mut().enumerate() {
        let field = parts.next().ok_or_else(|| {
            MonitorError::malformed(origin, format!("cpu line has {} of 8 fields", i))
        })?;
        *slot = field.parse().map_err(|_| {
            MonitorError::malformed(origin, format!("cpu field {:?} is not a number", field))
        })?;
    }

    let [user, nice, system, idle, iowait, irq, softirq, steal] = values;
    Ok(CpuTimes {
        user,
        nice,
        system,
        idle,
        iowait,
        irq,
        softirq,
        steal,
    })
}

/// First `model name` entry of a cpuinfo listing
pub fn parse_cpu_model(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with("model name"))
        .find_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Parse `Label: value kB` lines. `MemTotal` is required; other labels default to zero.
pub fn parse_meminfo(content: &str, origin: &str) -> Result<MemInfo> {
    let mut info = MemInfo::default();
    let mut saw_total = false;

    for line in content.lines() {
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        let mut fields = rest.split_whitespace();
        let Some(Ok(value)) = fields.next().map(str::parse::<u64>) else {
            log::debug!("Skipping meminfo line {:?}", line);
            continue;
        };
        let bytes = match fields.next() {
            Some("kB") => value.saturating_mul(1024),
            _ => value,
        };

        match label.trim() {
            "MemTotal" => {
                info.total = bytes;
                saw_total = true;
            }
            "MemFree" => info.free = bytes,
            "MemAvailable" => info.available = bytes,
            "Buffers" => info.buffers = bytes,
            "Cached" => info.cached = bytes,
            "Shmem" => info.shmem = bytes,
            "SReclaimable" => info.sreclaimable = bytes,
            "SwapTotal" => info.swap_total = bytes,
            "SwapFree" => info.swap_free = bytes,
            _ => {}
        }
    }

    if !saw_total {
        return Err(MonitorError::malformed(origin, "MemTotal missing"));
    }
    Ok(info)
}

/// Parse an fstab-format mount table, skipping short lines
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(device), Some(mount_point), Some(fs_type)) => Some(MountEntry {
                    device: unescape_mount_field(device),
                    mount_point: unescape_mount_field(mount_point),
                    fs_type: fs_type.to_string(),
                }),
                _ => {
                    if !line.trim().is_empty() {
                        log::debug!("Skipping mount line {:?}", line);
                    }
                    None
                }
            }
        })
        .collect()
}

/// Decode the `\ooo` octal escapes the kernel writes for whitespace and backslashes
pub fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let code = bytes[i + 1..i + 4]
                .iter()
                .fold(0u8, |acc, d| acc * 8 + (d - b'0'));
            out.push(code);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3
        && digits[0] <= b'3'
        && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}

/// Parse diskstats records; lines with fewer than 14 fields or bad numbers are skipped
pub fn parse_diskstats(content: &str) -> HashMap<String, DiskIoCounters> {
    let mut devices = HashMap::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            if !parts.is_empty() {
                log::debug!("Skipping short diskstats line {:?}", line);
            }
            continue;
        }

        match parse_disk_counters(&parts) {
            Some(counters) => {
                devices.insert(parts[2].to_string(), counters);
            }
            None => log::debug!("Skipping malformed diskstats line {:?}", line),
        }
    }

    devices
}

fn parse_disk_counters(parts: &[&str]) -> Option<DiskIoCounters> {
    Some(DiskIoCounters {
        reads_completed: parts[3].parse().ok()?,
        writes_completed: parts[7].parse().ok()?,
        io_in_progress: parts[11].parse().ok()?,
    })
}

/// Parse interface records after the two header lines, in source order
pub fn parse_net_dev(content: &str) -> Vec<InterfaceCounters> {
    content
        .lines()
        .skip(2)
        .filter_map(|line| {
            let parsed = parse_net_dev_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                log::debug!("Skipping malformed net/dev line {:?}", line);
            }
            parsed
        })
        .collect()
}

fn parse_net_dev_line(line: &str) -> Option<InterfaceCounters> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let fields = rest
        .split_whitespace()
        .map(str::parse::<u64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;
    if fields.len() < 12 {
        return None;
    }

    Some(InterfaceCounters {
        name: name.to_string(),
        rx_bytes: fields[0],
        rx_packets: fields[1],
        rx_errors: fields[2],
        rx_drops: fields[3],
        tx_bytes: fields[8],
        tx_packets: fields[9],
        tx_errors: fields[10],
        tx_drops: fields[11],
    })
}

#[cfg(unix)]
fn statvfs(mount_point: &Path) -> Result<FsSpace> {
    let stat = nix::sys::statvfs::statvfs(mount_point)
        .map_err(|errno| MonitorError::source_unavailable(mount_point, errno.into()))?;

    Ok(FsSpace {
        block_size: stat.fragment_size() as u64,
        blocks: stat.blocks() as u64,
        blocks_free: stat.blocks_free() as u64,
        blocks_available: stat.blocks_available() as u64,
    })
}

#[cfg(not(unix))]
fn statvfs(mount_point: &Path) -> Result<FsSpace> {
    Err(MonitorError::source_unavailable(
        mount_point,
        std::io::Error::new(std::io::ErrorKind::Unsupported, "statvfs not supported"),
    ))
}

#[cfg(unix)]
fn online_cores() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n < 1 {
        1
    } else {
        n as usize
    }
}

#[cfg(not(unix))]
fn online_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
