//! Ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total data frames emitted
    pub frames_emitted: AtomicU64,

    /// Total missing-frame tokens emitted
    pub missing_emitted: AtomicU64,

    /// Current channel occupancy
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record data frame emitted
    pub fn record_frame(&self) {
        self.frames_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record missing-frame token emitted
    pub fn record_missing(&self) {
        self.missing_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Update channel occupancy
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_emitted: self.frames_emitted.load(Ordering::Relaxed),
            missing_emitted: self.missing_emitted.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Total data frames emitted
    pub frames_emitted: u64,

    /// Total missing-frame tokens emitted
    pub missing_emitted: u64,

    /// Current channel occupancy
    pub queue_len: usize,
}
