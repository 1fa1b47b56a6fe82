//! Quality check evaluation
//!
//! One entry per `CheckKind`. A check reads the frame slice, the per-type
//! threshold table, the history of earlier passing frames and the results of
//! checks that already ran on the same frame.

use contracts::{
    attrs, CheckKind, CheckResult, FrameData, LimitKey, LimitViolation, Threshold, TypeLimits,
    VerifierError,
};

/// Classify one value against a threshold.
///
/// The low bound is evaluated first: a value below both bounds reports Low,
/// never High. At most one violation per result.
pub fn find_result(value: f64, check: CheckKind, threshold: &Threshold) -> CheckResult {
    let error = if threshold.low_limit.is_some_and(|low| value < low) {
        LimitViolation::Low
    } else if threshold.high_limit.is_some_and(|high| value > high) {
        LimitViolation::High
    } else {
        LimitViolation::None
    };

    CheckResult {
        value,
        check,
        error,
    }
}

/// Same-frame results of checks that already ran
#[derive(Debug, Default)]
pub struct PartialResults {
    results: Vec<CheckResult>,
}

impl PartialResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result of an earlier check on this frame, if it ran
    pub fn get(&self, check: CheckKind) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.check == check)
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn into_results(self) -> Vec<CheckResult> {
        self.results
    }
}

/// Read access to the per-type history of passing frames
pub trait CheckHistory {
    /// Values recorded for one check, oldest first
    fn values(&self, check: CheckKind) -> &[f64];
}

/// Everything a check may read
pub struct CheckContext<'a> {
    /// The frame under verification
    pub data: &'a FrameData,
    /// Threshold table of the frame's data type
    pub limits: &'a TypeLimits,
    /// History of passing frames of this type
    pub history: &'a dyn CheckHistory,
    /// Results of checks that already ran on this frame
    pub partial: &'a PartialResults,
}

impl CheckContext<'_> {
    fn data_type(&self) -> &str {
        self.data.data_type.as_str()
    }

    fn threshold(&self, key: LimitKey) -> Result<&Threshold, VerifierError> {
        self.limits.require(self.data_type(), key)
    }

    /// High bound of an auxiliary limit (point_sat / point_sat_rate)
    fn high_bound(&self, key: LimitKey) -> Result<f64, VerifierError> {
        self.threshold(key)?
            .high_limit
            .ok_or_else(|| VerifierError::limit_missing(self.data_type(), key))
    }

    fn base_result(&self, check: CheckKind, requires: CheckKind) -> Result<f64, VerifierError> {
        self.partial
            .get(requires)
            .map(|r| r.value)
            .ok_or(VerifierError::DependencyMissing { check, requires })
    }
}

/// Evaluate one check against the context
pub fn evaluate(check: CheckKind, ctx: &CheckContext<'_>) -> Result<CheckResult, VerifierError> {
    let value = match check {
        CheckKind::Mean => ctx.data.slice.mean(),
        CheckKind::StDev => ctx.data.slice.std_dev(),
        CheckKind::Sum => ctx.data.slice.sum(),
        CheckKind::FrameSatPts => saturated_points(ctx)?,
        CheckKind::FrameSatCntRate => saturation_rate_count(ctx)?,
        CheckKind::StatMean => mean_drift(ctx)?,
        CheckKind::AccSat => accumulated_saturation(ctx)?,
    };

    Ok(find_result(value, check, ctx.threshold(check.into())?))
}

/// Count of samples above the per-point saturation intensity
fn saturated_points(ctx: &CheckContext<'_>) -> Result<f64, VerifierError> {
    let point_sat = ctx.high_bound(LimitKey::PointSat)?;
    Ok(ctx.data.slice.count_above(point_sat) as f64)
}

/// Count of samples whose acquisition-time rate exceeds the per-point rate bound
fn saturation_rate_count(ctx: &CheckContext<'_>) -> Result<f64, VerifierError> {
    let rate_bound = ctx.high_bound(LimitKey::PointSatRate)?;
    let acq_time = ctx
        .data
        .attributes
        .float(attrs::ACQ_TIME)
        .ok_or_else(|| {
            VerifierError::attribute_missing(attrs::ACQ_TIME, CheckKind::FrameSatCntRate)
        })?;

    let count = ctx
        .data
        .slice
        .samples()
        .iter()
        .filter(|&&sample| sample / acq_time > rate_bound)
        .count();
    Ok(count as f64)
}

/// Drift of this frame's mean against the running mean of earlier frames.
///
/// With one prior frame the reference is that frame's mean; with n prior
/// frames it is the mean of the first n-1 of them. With no prior frames the
/// compared value is 0.
fn mean_drift(ctx: &CheckContext<'_>) -> Result<f64, VerifierError> {
    let frame_mean = ctx.base_result(CheckKind::StatMean, CheckKind::Mean)?;
    let history = ctx.history.values(CheckKind::Mean);

    let value = match history.len() {
        0 => 0.0,
        1 => frame_mean - history[0],
        n => {
            let reference: f64 = history[..n - 1].iter().sum::<f64>() / (n - 1) as f64;
            frame_mean - reference
        }
    };
    Ok(value)
}

/// Saturated points accumulated across the scan, including this frame
fn accumulated_saturation(ctx: &CheckContext<'_>) -> Result<f64, VerifierError> {
    let frame_sat = ctx.base_result(CheckKind::AccSat, CheckKind::FrameSatPts)?;
    let prior: f64 = ctx.history.values(CheckKind::FrameSatPts).iter().sum();
    Ok(prior + frame_sat)
}
