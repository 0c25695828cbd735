use super::metrics::{percentage, CpuMetrics};
use super::source::{CounterSource, CpuTimes};
use super::store::counter_delta;
use crate::error::Result;

const UNKNOWN_CPU: &str = "Unknown CPU";

/// Turns the cumulative CPU time buckets into a usage percentage
#[derive(Debug, Default)]
pub struct CpuSampler {
    model_name: Option<String>,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample CPU usage against `baseline`, replacing it on success.
    ///
    /// The first call reports 0% since there is nothing to compare against.
    /// When the counters cannot be read the baseline is left untouched.
    pub fn sample(
        &mut self,
        source: &dyn CounterSource,
        baseline: &mut Option<CpuTimes>,
    ) -> Result<CpuMetrics> {
        let model_name = self
            .model_name
            .get_or_insert_with(|| source.cpu_model().unwrap_or_else(|| UNKNOWN_CPU.to_string()))
            .clone();
        let core_count = source.online_cores();

        let current = source.cpu_times()?;
        let usage_percent = baseline
            .as_ref()
            .map(|previous| usage_between(previous, &current))
            .unwrap_or(0.0);
        *baseline = Some(current);

        Ok(CpuMetrics {
            usage_percent,
            core_count,
            model_name,
        })
    }
}

/// Busy share of the time elapsed between two readings.
///
/// Frozen counters (no time elapsed) count as idle.
pub fn usage_between(previous: &CpuTimes, current: &CpuTimes) -> f64 {
    let total_delta = counter_delta(current.total(), previous.total());
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = counter_delta(current.idle_total(), previous.idle_total());
    100.0 - percentage(idle_delta as f64, total_delta as f64)
}
