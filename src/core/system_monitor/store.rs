//! Previous-sample retention for the delta engines.
//!
//! Every delta engine reads and replaces its baselines here. The store is owned
//! by the collector and handed to each engine, so a fresh store means a fresh
//! set of first observations.

use std::collections::HashMap;

use super::source::CpuTimes;

/// Per-subsystem previous samples
#[derive(Debug, Default)]
pub struct SampleStore {
    pub cpu: Option<CpuTimes>,
    pub disks: EntityStore<DiskIoBaseline>,
    pub network: EntityStore<InterfaceBaseline>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cumulative I/O counts of a block device at the previous poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskIoBaseline {
    pub reads: u64,
    pub writes: u64,
}

/// Cumulative byte counts of an interface and when they were read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceBaseline {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub taken_at: std::time::Instant,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    sample: T,
    seen_in: u64,
}

/// Keyed store of one previous sample per entity.
///
/// A slot only counts as a baseline when its entity was observed during the
/// immediately preceding cycle. Slots of vanished entities are left in place
/// and simply never match again.
#[derive(Debug)]
pub struct EntityStore<T> {
    slots: HashMap<String, Slot<T>>,
    cycle: u64,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            cycle: 0,
        }
    }
}

impl<T: Clone> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new poll cycle. Must be called once before the cycle's `replace` calls.
    pub fn begin_cycle(&mut self) {
        self.cycle += 1;
    }

    /// Store `sample` for `key` and return the previous sample if it is still valid.
    pub fn replace(&mut self, key: &str, sample: T) -> Option<T> {
        let cycle = self.cycle;
        match self.slots.get_mut(key) {
            Some(slot) => {
                let previous = (slot.seen_in + 1 == cycle).then(|| slot.sample.clone());
                slot.sample = sample;
                slot.seen_in = cycle;
                previous
            }
            None => {
                self.slots.insert(
                    key.to_string(),
                    Slot {
                        sample,
                        seen_in: cycle,
                    },
                );
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Difference between two readings of a cumulative counter.
///
/// A counter that went backwards (device reset or reattached) yields zero.
pub fn counter_delta(current: u64, previous: u64) -> u64 {
    current.saturating_sub(previous)
}
