//! Status register backend
//!
//! Detector control systems expose a short status string, per-check failure
//! counters and a last-value slot. The trait keeps the delivery loop decoupled
//! from the concrete control-system binding; the in-memory implementation
//! backs tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{CheckKind, CheckResult, DataType};

/// Status string capacity imposed by the detector record
pub const STATUS_CAPACITY: usize = 300;

/// Write side of a detector status register
pub trait StatusRegister: Send + Sync {
    /// Replace the status string
    fn write_status(&self, text: &str);

    /// Bump the failure counter for one check of one data type
    fn increment_counter(&self, data_type: &DataType, check: CheckKind);

    /// Record the most recent result value for one check of one data type
    fn write_last_value(&self, data_type: &DataType, check: CheckKind, value: f64);
}

/// Compose the status string for one verdict
///
/// One line per failing result, `"{subject} verification pass"` when none.
/// The result is truncated to the register capacity on a char boundary.
pub fn compose_status(subject: &str, failing: &[CheckResult]) -> String {
    let text = if failing.is_empty() {
        format!("{subject} verification pass")
    } else {
        failing
            .iter()
            .map(|r| format!("{subject} failed {} with result {}", r.check, r.value))
            .collect::<Vec<_>>()
            .join("\n")
    };
    truncate_to_capacity(text)
}

fn truncate_to_capacity(mut text: String) -> String {
    if text.len() <= STATUS_CAPACITY {
        return text;
    }
    let mut cut = STATUS_CAPACITY;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}

/// In-memory status register
#[derive(Debug, Clone)]
pub struct InMemoryRegister {
    detector: String,
    state: Arc<Mutex<RegisterState>>,
}

#[derive(Debug, Default, Clone)]
struct RegisterState {
    status: String,
    counters: BTreeMap<String, u64>,
    last_values: BTreeMap<String, f64>,
}

/// Snapshot of the register contents
#[derive(Debug, Clone, Default)]
pub struct RegisterSnapshot {
    /// Detector prefix
    pub detector: String,
    /// Current status string
    pub status: String,
    /// Failure counters keyed by `{data_type}_{check}`
    pub counters: BTreeMap<String, u64>,
    /// Last recorded values keyed by `{data_type}_{check}`
    pub last_values: BTreeMap<String, f64>,
}

impl InMemoryRegister {
    /// Create a register for the given detector prefix
    pub fn new(detector: impl Into<String>) -> Self {
        Self {
            detector: detector.into(),
            state: Arc::new(Mutex::new(RegisterState::default())),
        }
    }

    /// Detector prefix
    pub fn detector(&self) -> &str {
        &self.detector
    }

    /// Copy out the current register contents
    pub fn snapshot(&self) -> RegisterSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        RegisterSnapshot {
            detector: self.detector.clone(),
            status: state.status.clone(),
            counters: state.counters.clone(),
            last_values: state.last_values.clone(),
        }
    }
}

fn slot_key(data_type: &DataType, check: CheckKind) -> String {
    format!("{data_type}_{check}")
}

impl StatusRegister for InMemoryRegister {
    fn write_status(&self, text: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.status = text.to_string();
    }

    fn increment_counter(&self, data_type: &DataType, check: CheckKind) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state.counters.entry(slot_key(data_type, check)).or_insert(0) += 1;
    }

    fn write_last_value(&self, data_type: &DataType, check: CheckKind, value: f64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.last_values.insert(slot_key(data_type, check), value);
    }
}
