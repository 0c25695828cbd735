use chrono::{Local, TimeZone};
use colored::*;
use humansize::{format_size as human_format_size, BINARY};
use std::fmt::Write;

use crate::core::system_monitor::{BoundedList, MetricsSnapshot};

/// Format a byte count in human-readable form (KiB, MiB, ...)
pub fn format_size(bytes: u64) -> String {
    human_format_size(bytes, BINARY)
}

/// Format a byte rate, e.g. `1.5 MiB/s`
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_size(bytes_per_sec.max(0.0) as u64))
}

/// Format a unix timestamp in local time (YYYY-MM-DD HH:MM:SS)
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

/// Create a usage bar with ASCII characters, colored by load
pub fn usage_bar(usage_percent: f64, width: usize) -> String {
    let filled = ((usage_percent.clamp(0.0, 100.0) / 100.0) * width as f64) as usize;
    let empty = width.saturating_sub(filled);

    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));

    let colored_bar = if usage_percent >= 85.0 {
        bar.red()
    } else if usage_percent >= 70.0 {
        bar.yellow()
    } else {
        bar.green()
    };

    format!("[{}]", colored_bar)
}

fn section_header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title.bold().green());
}

fn truncation_note<T>(out: &mut String, list: &BoundedList<T>, what: &str) {
    if list.truncated() {
        let _ = writeln!(
            out,
            "  {}",
            format!("(more {} present, showing first {})", what, list.capacity()).dimmed()
        );
    }
}

/// Render a snapshot as a compact text block
pub fn format_snapshot(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        "hostmon".bold().bright_cyan(),
        format_timestamp(snapshot.timestamp).dimmed()
    );

    let cpu = &snapshot.cpu;
    section_header(&mut out, "CPU");
    let _ = writeln!(out, "  {} ({} cores)", cpu.model_name, cpu.core_count);
    let _ = writeln!(
        out,
        "  {} {:5.1}%",
        usage_bar(cpu.usage_percent, 20),
        cpu.usage_percent
    );

    let mem = &snapshot.memory;
    section_header(&mut out, "Memory");
    let _ = writeln!(
        out,
        "  {} {:5.1}%  {} / {}",
        usage_bar(mem.usage_percent, 20),
        mem.usage_percent,
        format_size(mem.used_bytes),
        format_size(mem.total_bytes)
    );
    if mem.swap_total_bytes > 0 {
        let _ = writeln!(
            out,
            "  Swap: {} / {} ({:.1}%)",
            format_size(mem.swap_used_bytes),
            format_size(mem.swap_total_bytes),
            mem.swap_percent
        );
    }

    if !snapshot.disks.is_empty() {
        section_header(&mut out, "Disks");
        for disk in &snapshot.disks {
            let _ = writeln!(
                out,
                "  {:<16} {} {:5.1}%  {} free  r/w {}/{}",
                disk.mount_point,
                usage_bar(disk.usage_percent, 10),
                disk.usage_percent,
                format_size(disk.available_bytes),
                disk.reads,
                disk.writes
            );
        }
        truncation_note(&mut out, &snapshot.disks, "filesystems");
    }

    if !snapshot.network.is_empty() {
        section_header(&mut out, "Network");
        for iface in &snapshot.network {
            let _ = writeln!(
                out,
                "  {:<16} rx {:>12}  tx {:>12}",
                iface.interface,
                format_rate(iface.receive_speed),
                format_rate(iface.send_speed)
            );
        }
        truncation_note(&mut out, &snapshot.network, "interfaces");
    }

    section_header(&mut out, &format!("GPU ({})", snapshot.gpu_backend));
    if snapshot.gpus.is_empty() {
        let _ = writeln!(out, "  {}", "No GPU detected".dimmed());
    }
    for gpu in &snapshot.gpus {
        if gpu.supported {
            let _ = writeln!(
                out,
                "  [{}] {}  {:.0}%  {}°C  {} / {}  {:.1} W  fan {}%",
                gpu.index,
                gpu.name,
                gpu.utilization_percent,
                gpu.temperature_celsius,
                format_size(gpu.memory_used_bytes),
                format_size(gpu.memory_total_bytes),
                gpu.power_usage_mw as f64 / 1000.0,
                gpu.fan_speed_percent
            );
        } else {
            let _ = writeln!(
                out,
                "  [{}] {} {}",
                gpu.index,
                gpu.name,
                "(no telemetry)".dimmed()
            );
        }
    }
    truncation_note(&mut out, &snapshot.gpus, "GPUs");

    out
}
