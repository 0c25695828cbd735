use std::time::Instant;

use super::metrics::{BoundedList, NetworkMetrics, MAX_INTERFACES};
use super::source::CounterSource;
use super::store::{counter_delta, EntityStore, InterfaceBaseline};
use crate::error::Result;

/// Throughput sampling per network interface, keyed by interface name
pub struct NetworkSampler {
    capacity: usize,
}

impl Default for NetworkSampler {
    fn default() -> Self {
        Self::with_capacity(MAX_INTERFACES)
    }
}

impl NetworkSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Sample all interfaces as of `now`.
    ///
    /// Each interface's rate uses the time since that interface was last seen,
    /// not the nominal polling period.
    pub fn sample(
        &self,
        source: &dyn CounterSource,
        store: &mut EntityStore<InterfaceBaseline>,
        now: Instant,
    ) -> Result<BoundedList<NetworkMetrics>> {
        let interfaces = source.interfaces()?;

        store.begin_cycle();
        let mut network = BoundedList::with_capacity(self.capacity);

        for counters in interfaces {
            if network.is_full() {
                log::debug!(
                    "Interface limit of {} reached, skipping {}",
                    self.capacity,
                    counters.name
                );
                network.mark_truncated();
                break;
            }

            let current = InterfaceBaseline {
                bytes_received: counters.rx_bytes,
                bytes_sent: counters.tx_bytes,
                taken_at: now,
            };
            let (receive_speed, send_speed) = match store.replace(&counters.name, current) {
                Some(previous) => {
                    let elapsed = now
                        .saturating_duration_since(previous.taken_at)
                        .as_secs_f64();
                    (
                        throughput(current.bytes_received, previous.bytes_received, elapsed),
                        throughput(current.bytes_sent, previous.bytes_sent, elapsed),
                    )
                }
                None => (0.0, 0.0),
            };

            network.push(NetworkMetrics {
                interface: counters.name,
                bytes_received: counters.rx_bytes,
                bytes_sent: counters.tx_bytes,
                packets_received: counters.rx_packets,
                packets_sent: counters.tx_packets,
                errors_in: counters.rx_errors,
                errors_out: counters.tx_errors,
                drops_in: counters.rx_drops,
                drops_out: counters.tx_drops,
                receive_speed,
                send_speed,
            });
        }

        Ok(network)
    }
}

/// Bytes per second between two counter readings `elapsed_secs` apart
pub fn throughput(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    counter_delta(current, previous) as f64 / elapsed_secs
}
