use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the producer/consumer handoff
#[derive(Debug, Default)]
pub struct HandoffMetrics {
    writes: AtomicU64,
    overwritten: AtomicU64,
    scheduled: AtomicU64,
    delivered: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffSnapshot {
    pub writes: u64,
    /// Values replaced before the consumer read them
    pub overwritten: u64,
    pub scheduled: u64,
    pub delivered: u64,
}

impl HandoffMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overwrite(&self) {
        self.overwritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HandoffSnapshot {
        HandoffSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
            scheduled: self.scheduled.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

impl HandoffSnapshot {
    /// Fraction of writes the consumer never saw
    pub fn drop_ratio(&self) -> f64 {
        if self.writes == 0 {
            return 0.0;
        }
        self.overwritten as f64 / self.writes as f64
    }
}
