//! Verdict - quality outcome for one frame

use serde::{Deserialize, Serialize};

use crate::{frame::attrs, CheckResult, DataType, FrameData};

/// Pass/fail outcome and full per-check result list for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Data type of the verified frame
    pub data_type: DataType,

    /// Handler-assigned frame index
    pub index: u64,

    /// True iff any check result reports a limit violation
    pub failed: bool,

    /// Results in configured check order
    pub results: Vec<CheckResult>,

    /// Source file name, when the feed decorator supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Verdict {
    /// Build a verdict from ordered results, deriving `failed`
    pub fn new(data_type: DataType, index: u64, results: Vec<CheckResult>) -> Self {
        let failed = results.iter().any(|r| r.error.is_violation());
        Self {
            data_type,
            index,
            failed,
            results,
            file_name: None,
        }
    }

    /// Results with a limit violation
    pub fn failing_results(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.error.is_violation())
    }

    /// Human-readable subject for feedback lines: the file name when known,
    /// otherwise `frame <index>`
    pub fn subject(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("frame {}", self.index),
        }
    }
}

/// Frame plus verdict flag, the unit fanned out to consumer sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedFrame {
    /// Handler-assigned index
    pub index: u64,

    /// Inverse of the verdict's failed flag
    pub passed: bool,

    /// The frame as received
    pub data: FrameData,
}

impl VerifiedFrame {
    /// Rotation angle attribute, defaulting to 0 when not decorated
    pub fn theta(&self) -> f64 {
        self.data.attributes.float(attrs::THETA).unwrap_or(0.0)
    }
}
