//! Verification metrics collection
//!
//! Prometheus counters plus an in-memory aggregator for the end-of-run
//! summary.

use std::collections::BTreeMap;

use contracts::{CheckKind, Verdict};
use metrics::{counter, gauge, histogram};

/// Record one verdict's worth of metrics
///
/// Call once per verified data frame.
pub fn record_verdict(verdict: &Verdict) {
    let data_type = verdict.data_type.to_string();

    counter!("frameguard_frames_verified_total", "data_type" => data_type.clone()).increment(1);
    gauge!("frameguard_last_frame_index", "data_type" => data_type.clone())
        .set(verdict.index as f64);

    if verdict.failed {
        counter!("frameguard_frames_failed_total", "data_type" => data_type.clone()).increment(1);
    }

    for result in &verdict.results {
        histogram!(
            "frameguard_check_value",
            "data_type" => data_type.clone(),
            "check" => result.check.as_str()
        )
        .record(result.value);

        if result.error.is_violation() {
            counter!(
                "frameguard_check_failures_total",
                "data_type" => data_type.clone(),
                "check" => result.check.as_str()
            )
            .increment(1);
        }
    }
}

/// Record a missing frame token
pub fn record_missing_frame() {
    counter!("frameguard_frames_missing_total").increment(1);
}

/// Record a frame handed to a consumer queue
pub fn record_frame_forwarded(consumer: &str, accepted: bool) {
    let status = if accepted { "queued" } else { "dropped" };
    counter!(
        "frameguard_frames_forwarded_total",
        "consumer" => consumer.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a verdict pushed to the feedback queue
pub fn record_feedback_sent(data_type: &str) {
    counter!(
        "frameguard_feedback_sent_total",
        "data_type" => data_type.to_string()
    )
    .increment(1);
}

/// Record frame channel occupancy
pub fn record_channel_depth(depth: usize) {
    gauge!("frameguard_frame_channel_depth").set(depth as f64);
}

/// Verdict aggregator
///
/// Aggregates verdicts in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct VerdictStatsAggregator {
    /// Total verified frames
    pub total_frames: u64,

    /// Frames with at least one failing check
    pub failed_frames: u64,

    /// Missing frame tokens seen
    pub missing_frames: u64,

    /// Failure count per check
    pub check_failures: BTreeMap<CheckKind, u64>,

    /// Value statistics per check
    pub check_stats: BTreeMap<CheckKind, RunningStats>,
}

impl VerdictStatsAggregator {
    /// Create new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one verdict into the totals
    pub fn update(&mut self, verdict: &Verdict) {
        self.total_frames += 1;
        if verdict.failed {
            self.failed_frames += 1;
        }

        for result in &verdict.results {
            self.check_stats
                .entry(result.check)
                .or_default()
                .push(result.value);
            if result.error.is_violation() {
                *self.check_failures.entry(result.check).or_insert(0) += 1;
            }
        }
    }

    /// Count a missing frame token
    pub fn record_missing(&mut self) {
        self.missing_frames += 1;
    }

    /// Produce the summary report
    pub fn summary(&self) -> VerdictSummary {
        VerdictSummary {
            total_frames: self.total_frames,
            failed_frames: self.failed_frames,
            missing_frames: self.missing_frames,
            failure_rate: if self.total_frames > 0 {
                self.failed_frames as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            check_failures: self.check_failures.clone(),
            check_stats: self
                .check_stats
                .iter()
                .map(|(check, stats)| (*check, StatsSummary::from(stats)))
                .collect(),
        }
    }

    /// Reset all totals
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of one verification run
#[derive(Debug, Clone, Default)]
pub struct VerdictSummary {
    pub total_frames: u64,
    pub failed_frames: u64,
    pub missing_frames: u64,
    pub failure_rate: f64,
    pub check_failures: BTreeMap<CheckKind, u64>,
    pub check_stats: BTreeMap<CheckKind, StatsSummary>,
}

impl std::fmt::Display for VerdictSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Verification Summary ===")?;
        writeln!(f, "Verified frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Failed frames: {} ({:.2}%)",
            self.failed_frames, self.failure_rate
        )?;
        writeln!(f, "Missing frames: {}", self.missing_frames)?;

        if !self.check_stats.is_empty() {
            writeln!(f, "Check values:")?;
            for (check, stats) in &self.check_stats {
                let failures = self.check_failures.get(check).copied().unwrap_or(0);
                writeln!(f, "  {}: {} failures={}", check, stats, failures)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
