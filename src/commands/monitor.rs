//! Monitor command handler.
//!
//! Samples the host once per second and prints each snapshot as text or as
//! one JSON object per line.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::{Config, MetricsCollector, MetricsSnapshot};
use crate::ui::format_snapshot;

/// Time between two samples
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Granularity of the Ctrl+C check while waiting for the next tick
const STOP_CHECK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Execute the monitor command
pub fn execute(matches: &ArgMatches, config: &Config) -> Result<()> {
    let format = if matches.get_flag("json") {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let once = matches.get_flag("once");

    let mut collector = MetricsCollector::new(config);
    log::info!("Monitoring with {} GPU backend", collector.gpu_backend());

    let result = if once {
        run_once(&mut collector, format)
    } else {
        run_loop(&mut collector, format)
    };

    collector.shutdown();
    result
}

/// Take a baseline, wait one interval and print a single snapshot
fn run_once(collector: &mut MetricsCollector, format: OutputFormat) -> Result<()> {
    if let Err(e) = collector.collect() {
        log::warn!("Baseline sample failed: {}", e);
    }
    thread::sleep(POLL_INTERVAL);

    let snapshot = collector.collect().context("Failed to sample host metrics")?;
    print_snapshot(&snapshot, format)
}

fn run_loop(collector: &mut MetricsCollector, format: OutputFormat) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    if format == OutputFormat::Text {
        println!("{}", "Press Ctrl+C to stop".dimmed());
    }

    while running.load(Ordering::Relaxed) {
        let started = Instant::now();

        match collector.collect() {
            Ok(snapshot) => print_snapshot(&snapshot, format)?,
            // the next tick retries every subsystem
            Err(e) => log::warn!("Sampling cycle failed: {}", e),
        }

        wait_for_next_tick(started, &running);
    }

    log::debug!("Monitor stopped");
    Ok(())
}

fn wait_for_next_tick(started: Instant, running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        let elapsed = started.elapsed();
        if elapsed >= POLL_INTERVAL {
            break;
        }
        thread::sleep(STOP_CHECK.min(POLL_INTERVAL - elapsed));
    }
}

fn print_snapshot(snapshot: &MetricsSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;
            println!("{}", line);
        }
        OutputFormat::Text => println!("{}", format_snapshot(snapshot)),
    }
    Ok(())
}
