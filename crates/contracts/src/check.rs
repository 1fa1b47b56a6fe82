//! Quality check identifiers, thresholds and per-check results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::VerifierError;

/// Closed set of quality checks the engine can run.
///
/// Replaces the stringly-typed check lookup of ad-hoc verifier scripts with a
/// tagged enum; the config layer parses check names into this type so an
/// unknown check is rejected before the first frame is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Mean signal intensity of the slice
    Mean,
    /// Standard deviation of the slice
    StDev,
    /// Sum of all sample intensities
    Sum,
    /// Count of point-saturated samples in the frame
    FrameSatPts,
    /// Count of samples whose intensity rate (value / acq_time) saturates
    FrameSatCntRate,
    /// Delta of the frame mean against the running mean of passing frames
    StatMean,
    /// Accumulated saturated-point count across passing frames plus current
    AccSat,
}

impl CheckKind {
    /// All known checks, in declaration order
    pub const ALL: [CheckKind; 7] = [
        CheckKind::Mean,
        CheckKind::StDev,
        CheckKind::Sum,
        CheckKind::FrameSatPts,
        CheckKind::FrameSatCntRate,
        CheckKind::StatMean,
        CheckKind::AccSat,
    ];

    /// Stable snake_case name, matching config files and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Mean => "mean",
            CheckKind::StDev => "st_dev",
            CheckKind::Sum => "sum",
            CheckKind::FrameSatPts => "frame_sat_pts",
            CheckKind::FrameSatCntRate => "frame_sat_cnt_rate",
            CheckKind::StatMean => "stat_mean",
            CheckKind::AccSat => "acc_sat",
        }
    }

    /// Base check whose same-frame result this check reads, if any.
    ///
    /// Statistical checks must be listed after their base check so the base
    /// result is already in the partial-results map when they run.
    pub fn depends_on(&self) -> Option<CheckKind> {
        match self {
            CheckKind::StatMean => Some(CheckKind::Mean),
            CheckKind::AccSat => Some(CheckKind::FrameSatPts),
            _ => None,
        }
    }

    /// True for checks that read the rolling history of prior frames
    pub fn is_statistical(&self) -> bool {
        self.depends_on().is_some()
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = VerifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                VerifierError::config_validation("checks", format!("unknown quality check '{s}'"))
            })
    }
}

/// Outcome of comparing a check value against its threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitViolation {
    /// Within limits
    #[default]
    None,
    /// Below the configured low limit
    Low,
    /// Above the configured high limit
    High,
}

impl LimitViolation {
    /// True unless the value was within limits
    pub fn is_violation(&self) -> bool {
        !matches!(self, LimitViolation::None)
    }
}

/// Result of one quality check for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Measured value
    pub value: f64,
    /// Which check produced it
    pub check: CheckKind,
    /// Threshold comparison outcome
    pub error: LimitViolation,
}

/// Low/high threshold pair for one limit key
///
/// Either bound may be absent; an absent bound is simply not checked on that
/// side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Values strictly below this fail Low
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_limit: Option<f64>,
    /// Values strictly above this fail High
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_limit: Option<f64>,
}

impl Threshold {
    /// Low bound only
    pub fn low(limit: f64) -> Self {
        Self {
            low_limit: Some(limit),
            high_limit: None,
        }
    }

    /// High bound only
    pub fn high(limit: f64) -> Self {
        Self {
            low_limit: None,
            high_limit: Some(limit),
        }
    }

    /// Both bounds
    pub fn band(low: f64, high: f64) -> Self {
        Self {
            low_limit: Some(low),
            high_limit: Some(high),
        }
    }
}

/// Key into a data type's limits table.
///
/// Covers every check plus the auxiliary per-point saturation thresholds that
/// are consumed inside the saturation checks rather than compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKey {
    Mean,
    StDev,
    Sum,
    FrameSatPts,
    FrameSatCntRate,
    StatMean,
    AccSat,
    /// Per-sample saturation intensity, used by `frame_sat_pts`
    PointSat,
    /// Per-sample saturation rate, used by `frame_sat_cnt_rate`
    PointSatRate,
}

impl From<CheckKind> for LimitKey {
    fn from(check: CheckKind) -> Self {
        match check {
            CheckKind::Mean => LimitKey::Mean,
            CheckKind::StDev => LimitKey::StDev,
            CheckKind::Sum => LimitKey::Sum,
            CheckKind::FrameSatPts => LimitKey::FrameSatPts,
            CheckKind::FrameSatCntRate => LimitKey::FrameSatCntRate,
            CheckKind::StatMean => LimitKey::StatMean,
            CheckKind::AccSat => LimitKey::AccSat,
        }
    }
}

impl fmt::Display for LimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LimitKey::Mean => "mean",
            LimitKey::StDev => "st_dev",
            LimitKey::Sum => "sum",
            LimitKey::FrameSatPts => "frame_sat_pts",
            LimitKey::FrameSatCntRate => "frame_sat_cnt_rate",
            LimitKey::StatMean => "stat_mean",
            LimitKey::AccSat => "acc_sat",
            LimitKey::PointSat => "point_sat",
            LimitKey::PointSatRate => "point_sat_rate",
        };
        f.write_str(s)
    }
}

/// Threshold table for one data type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeLimits(BTreeMap<LimitKey, Threshold>);

impl TypeLimits {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a threshold, builder style
    pub fn with(mut self, key: LimitKey, threshold: Threshold) -> Self {
        self.0.insert(key, threshold);
        self
    }

    /// Insert or replace a threshold
    pub fn insert(&mut self, key: LimitKey, threshold: Threshold) {
        self.0.insert(key, threshold);
    }

    /// Look up a threshold
    pub fn get(&self, key: LimitKey) -> Option<&Threshold> {
        self.0.get(&key)
    }

    /// Threshold that must exist for an evaluation to proceed
    ///
    /// # Errors
    /// `VerifierError::LimitMissing` if the key is not configured; the
    /// config validator catches this before the first frame, so hitting it at
    /// runtime means the run is misconfigured and must stop.
    pub fn require(&self, data_type: &str, key: LimitKey) -> Result<&Threshold, VerifierError> {
        self.0
            .get(&key)
            .ok_or_else(|| VerifierError::limit_missing(data_type, key))
    }

    /// Contained keys
    pub fn keys(&self) -> impl Iterator<Item = LimitKey> + '_ {
        self.0.keys().copied()
    }

    /// Number of configured thresholds
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no thresholds are configured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
