//! End-of-stream verification report

use std::collections::BTreeMap;

use contracts::{CheckKind, CheckResult};
use serde::Serialize;

use crate::aggregate::Aggregate;

/// Retained state of one data type at end of stream
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    /// Failing frames by handler index
    pub bad_indexes: BTreeMap<u64, Vec<CheckResult>>,
    /// Passing frames by handler index
    pub good_indexes: BTreeMap<u64, Vec<CheckResult>>,
    /// Per-check value history of passing frames
    pub history: BTreeMap<CheckKind, Vec<f64>>,
}

/// Final report published once over the report channel.
///
/// Only data types that retained at least one verdict appear; a run under
/// the forward-only policy yields an empty report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub types: BTreeMap<String, ReportEntry>,
}

impl Report {
    /// Collect the non-empty aggregates
    pub fn from_aggregates<'a>(aggregates: impl Iterator<Item = &'a Aggregate>) -> Self {
        let mut types = BTreeMap::new();
        for agg in aggregates {
            if agg.is_empty() {
                continue;
            }
            types.insert(
                agg.data_type().to_string(),
                ReportEntry {
                    bad_indexes: agg.bad_indexes().clone(),
                    good_indexes: agg.good_indexes().clone(),
                    history: agg.history().clone(),
                },
            );
        }
        Self { types }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total failing frames across all types
    pub fn failed_frames(&self) -> usize {
        self.types.values().map(|e| e.bad_indexes.len()).sum()
    }

    /// Total passing frames across all types
    pub fn passed_frames(&self) -> usize {
        self.types.values().map(|e| e.good_indexes.len()).sum()
    }
}
