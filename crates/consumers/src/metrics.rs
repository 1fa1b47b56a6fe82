//! Per-consumer metrics for observability

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single consumer sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total frames written
    frames_written: AtomicU64,
    /// Total write failures
    write_failures: AtomicU64,
    /// Total frames dropped due to full queue
    frames_dropped: AtomicU64,
    /// End token delivered to the sink
    end_delivered: AtomicBool,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get total written frame count
    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Increment written frame count
    pub fn inc_frames_written(&self) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Get write failure count
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Increment write failure count
    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dropped frame count
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Increment dropped frame count
    pub fn inc_frames_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// True once the end token reached the sink
    pub fn end_delivered(&self) -> bool {
        self.end_delivered.load(Ordering::Relaxed)
    }

    /// Mark the end token as delivered
    pub fn mark_end_delivered(&self) {
        self.end_delivered.store(true, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            frames_written: self.frames_written(),
            write_failures: self.write_failures(),
            frames_dropped: self.frames_dropped(),
            end_delivered: self.end_delivered(),
        }
    }
}

/// Snapshot of consumer metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub frames_written: u64,
    pub write_failures: u64,
    pub frames_dropped: u64,
    pub end_delivered: bool,
}
