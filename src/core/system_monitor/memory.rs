use super::metrics::{percentage, MemoryMetrics};
use super::source::{CounterSource, MemInfo};
use crate::error::Result;

/// Read current memory usage. Memory counters are absolute, so nothing is retained.
pub fn sample_memory(source: &dyn CounterSource) -> Result<MemoryMetrics> {
    Ok(MemoryMetrics::from_meminfo(&source.meminfo()?))
}

impl MemoryMetrics {
    /// Derive usage figures, counting reclaimable cache and buffers as unused
    pub fn from_meminfo(info: &MemInfo) -> Self {
        let cached = (info.cached + info.sreclaimable).saturating_sub(info.shmem);
        let used = info
            .total
            .saturating_sub(info.free)
            .saturating_sub(info.buffers)
            .saturating_sub(cached);

        let swap_used = info.swap_total.saturating_sub(info.swap_free);
        let swap_percent = if info.swap_total > 0 {
            100.0 - percentage(info.swap_free as f64, info.swap_total as f64)
        } else {
            0.0
        };

        MemoryMetrics {
            total_bytes: info.total,
            free_bytes: info.free,
            available_bytes: info.available,
            used_bytes: used,
            buffers_bytes: info.buffers,
            cached_bytes: cached,
            swap_total_bytes: info.swap_total,
            swap_free_bytes: info.swap_free,
            swap_used_bytes: swap_used,
            usage_percent: percentage(used as f64, info.total as f64),
            swap_percent,
        }
    }
}
