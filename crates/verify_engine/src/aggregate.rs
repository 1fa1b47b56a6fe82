//! Per-data-type verdict retention
//!
//! The handler loop is the sole mutator of an `Aggregate`, so no locking is
//! needed. Passing and failing frames land in disjoint index maps and the
//! values of passing frames build the history that the statistical checks
//! read.

use std::collections::BTreeMap;

use contracts::{CheckKind, CheckResult, DataType, FeedbackMessage, RetentionPolicy, Verdict};
use tokio::sync::mpsc;
use tracing::debug;

use crate::checks::CheckHistory;

/// Retained verdicts and history for one data type
pub struct Aggregate {
    data_type: DataType,
    retention: RetentionPolicy,
    feedback: Option<mpsc::UnboundedSender<FeedbackMessage>>,
    bad_indexes: BTreeMap<u64, Vec<CheckResult>>,
    good_indexes: BTreeMap<u64, Vec<CheckResult>>,
    history: BTreeMap<CheckKind, Vec<f64>>,
    end_sent: bool,
}

impl Aggregate {
    pub fn new(
        data_type: DataType,
        retention: RetentionPolicy,
        feedback: Option<mpsc::UnboundedSender<FeedbackMessage>>,
    ) -> Self {
        Self {
            data_type,
            retention,
            feedback,
            bad_indexes: BTreeMap::new(),
            good_indexes: BTreeMap::new(),
            history: BTreeMap::new(),
            end_sent: false,
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Record one verdict.
    ///
    /// Under the forward-only policy every verdict goes straight to the
    /// feedback channel and nothing is retained. Otherwise failed frames land
    /// in `bad_indexes` (and are forwarded), passing frames land in
    /// `good_indexes` and extend the history.
    pub fn handle_results(&mut self, verdict: Verdict) {
        if self.retention.is_forward() {
            self.forward(verdict);
            return;
        }

        if verdict.failed {
            self.bad_indexes.insert(verdict.index, verdict.results.clone());
            self.forward(verdict);
        } else {
            self.good_indexes.insert(verdict.index, verdict.results.clone());
            for result in &verdict.results {
                self.history.entry(result.check).or_default().push(result.value);
            }
        }
        self.apply_cap();
    }

    fn forward(&self, verdict: Verdict) {
        if let Some(feedback) = &self.feedback {
            if feedback.send(FeedbackMessage::Verdict(verdict)).is_err() {
                debug!(data_type = %self.data_type, "feedback channel closed, verdict dropped");
            }
        }
    }

    fn apply_cap(&mut self) {
        let RetentionPolicy::Bounded(cap) = self.retention else {
            return;
        };
        while self.bad_indexes.len() > cap {
            self.bad_indexes.pop_first();
        }
        while self.good_indexes.len() > cap {
            self.good_indexes.pop_first();
        }
        for values in self.history.values_mut() {
            while values.len() > cap {
                values.remove(0);
            }
        }
    }

    /// Deliver the stream-end token to the feedback channel, once
    pub fn end(&mut self) {
        if self.end_sent {
            return;
        }
        self.end_sent = true;
        if let Some(feedback) = &self.feedback {
            let _ = feedback.send(FeedbackMessage::End);
        }
    }

    /// Whether a verdict with the given outcome would cross the feedback
    /// channel
    pub fn will_forward(&self, failed: bool) -> bool {
        self.feedback.is_some() && (self.retention.is_forward() || failed)
    }

    /// True when no verdict has been retained
    pub fn is_empty(&self) -> bool {
        self.bad_indexes.is_empty() && self.good_indexes.is_empty()
    }

    pub fn bad_indexes(&self) -> &BTreeMap<u64, Vec<CheckResult>> {
        &self.bad_indexes
    }

    pub fn good_indexes(&self) -> &BTreeMap<u64, Vec<CheckResult>> {
        &self.good_indexes
    }

    pub fn history(&self) -> &BTreeMap<CheckKind, Vec<f64>> {
        &self.history
    }
}

impl CheckHistory for Aggregate {
    fn values(&self, check: CheckKind) -> &[f64] {
        self.history.get(&check).map(Vec::as_slice).unwrap_or(&[])
    }
}
