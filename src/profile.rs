//! Profile event buffers (§6 "Outputs", §5 "Profile counters"). The core
//! never writes a profile log itself — that's the profiler event sink,
//! explicitly out of scope — but it accumulates the events an external
//! sink would consume, and must do so safely from inside `Parallel`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct StratumRecord {
    pub index: usize,
    pub relations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuantityEvent {
    pub key: String,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimerEvent {
    pub message: String,
    pub relation: Option<String>,
    pub elapsed: Duration,
}

/// Per-relation read counters, keyed `@relation-reads;NAME` per §6.
#[derive(Default)]
pub struct ProfileBuffers {
    enabled: bool,
    strata: Mutex<Vec<StratumRecord>>,
    quantities: Mutex<Vec<QuantityEvent>>,
    timers: Mutex<Vec<TimerEvent>>,
    reads: dashmap::DashMap<String, AtomicU64, ahash::RandomState>,
    /// `frequencies[profile_text][iteration]` (§6 "quantity events for
    /// relation sizes and frequencies"): how many times a given search/filter
    /// operation node fired, bucketed by the enclosing `Loop`'s iteration
    /// counter, mirroring `Interpreter::frequencies`.
    frequencies: dashmap::DashMap<String, dashmap::DashMap<i64, AtomicU64, ahash::RandomState>, ahash::RandomState>,
}

impl ProfileBuffers {
    pub fn new(enabled: bool) -> Self {
        ProfileBuffers {
            enabled,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_stratum(&self, index: usize, relations: Vec<String>) {
        if !self.enabled {
            return;
        }
        self.strata.lock().unwrap().push(StratumRecord { index, relations });
    }

    pub fn record_quantity(&self, key: impl Into<String>, value: u64) {
        if !self.enabled {
            return;
        }
        self.quantities.lock().unwrap().push(QuantityEvent {
            key: key.into(),
            value,
        });
    }

    pub fn record_timer(&self, message: impl Into<String>, relation: Option<String>, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        self.timers.lock().unwrap().push(TimerEvent {
            message: message.into(),
            relation,
            elapsed,
        });
    }

    /// Bumps the read counter for a non-temporary relation (§4.6
    /// `ExistenceCheck`: "Tracks per-relation read counters when profiling
    /// is enabled and the relation is not temporary").
    pub fn record_read(&self, relation: &str) {
        if !self.enabled || relation.starts_with('@') {
            return;
        }
        self.reads
            .entry(relation.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_counts(&self) -> HashMap<String, u64> {
        self.reads
            .iter()
            .map(|e| (format!("@relation-reads;{}", e.key()), e.value().load(Ordering::Relaxed)))
            .collect()
    }

    /// Bumps the frequency counter for a profile-text-labeled operation node
    /// at the given fixed-point iteration. A no-op when `text` is empty,
    /// matching `!search.getProfileText().empty()` in the original.
    pub fn record_frequency(&self, text: &str, iteration: i64) {
        if !self.enabled || text.is_empty() {
            return;
        }
        self.frequencies
            .entry(text.to_string())
            .or_insert_with(|| dashmap::DashMap::with_hasher(ahash::RandomState::new()))
            .entry(iteration)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn frequency_counts(&self) -> HashMap<String, HashMap<i64, u64>> {
        self.frequencies
            .iter()
            .map(|e| {
                let per_iteration = e
                    .value()
                    .iter()
                    .map(|c| (*c.key(), c.value().load(Ordering::Relaxed)))
                    .collect();
                (e.key().clone(), per_iteration)
            })
            .collect()
    }
}
