//! Configuration validation
//!
//! Rules:
//! - data_type unique, at least one type configured
//! - check lists non-empty, no duplicates
//! - a statistical check listed after the base check it reads
//! - every configured check has a threshold (point_sat / point_sat_rate
//!   additionally needed by the saturation checks)
//! - consumer names unique and non-empty, queue_capacity > 0
//! - bounded retention cap > 0
//! - source missing indexes within the frame range
//! - status_register feedback requires a detector prefix

use std::collections::HashSet;

use contracts::{CheckKind, LimitKey, VerifierBlueprint, VerifierError};

/// Validate a VerifierBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    validate_types(blueprint)?;
    validate_checks(blueprint)?;
    validate_limits(blueprint)?;
    validate_retention(blueprint)?;
    validate_consumers(blueprint)?;
    validate_source(blueprint)?;
    validate_feedback(blueprint)?;
    Ok(())
}

/// At least one type, data_type unique
fn validate_types(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    if blueprint.types.is_empty() {
        return Err(VerifierError::config_validation(
            "types",
            "at least one data type must be configured",
        ));
    }
    let mut seen = HashSet::new();
    for cfg in &blueprint.types {
        if !seen.insert(&cfg.data_type) {
            return Err(VerifierError::config_validation(
                format!("types[data_type={}]", cfg.data_type),
                "duplicate data_type",
            ));
        }
    }
    Ok(())
}

/// Check lists non-empty, duplicate-free, and dependency-ordered
fn validate_checks(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    for cfg in &blueprint.types {
        if cfg.checks.is_empty() {
            return Err(VerifierError::config_validation(
                format!("types[{}].checks", cfg.data_type),
                "check list cannot be empty",
            ));
        }

        let mut seen: Vec<CheckKind> = Vec::new();
        for check in &cfg.checks {
            if seen.contains(check) {
                return Err(VerifierError::config_validation(
                    format!("types[{}].checks", cfg.data_type),
                    format!("duplicate check '{check}'"),
                ));
            }
            if let Some(base) = check.depends_on() {
                if !seen.contains(&base) {
                    return Err(VerifierError::config_validation(
                        format!("types[{}].checks", cfg.data_type),
                        format!("check '{check}' must be listed after '{base}'"),
                    ));
                }
            }
            seen.push(*check);
        }
    }
    Ok(())
}

/// Every configured check carries a threshold
fn validate_limits(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    for cfg in &blueprint.types {
        for check in &cfg.checks {
            let key = LimitKey::from(*check);
            if cfg.limits.get(key).is_none() {
                return Err(VerifierError::config_validation(
                    format!("types[{}].limits", cfg.data_type),
                    format!("no '{key}' threshold for configured check '{check}'"),
                ));
            }
            // Saturation checks read auxiliary high bounds from the same table
            for aux in saturation_aux_keys(*check) {
                let bound = cfg.limits.get(*aux).and_then(|t| t.high_limit);
                if bound.is_none() {
                    return Err(VerifierError::config_validation(
                        format!("types[{}].limits", cfg.data_type),
                        format!("check '{check}' needs a '{aux}' high_limit"),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Auxiliary limit keys a saturation check reads beyond its own threshold
fn saturation_aux_keys(check: CheckKind) -> &'static [LimitKey] {
    match check {
        CheckKind::FrameSatPts => &[LimitKey::PointSat],
        CheckKind::FrameSatCntRate => &[LimitKey::PointSatRate],
        _ => &[],
    }
}

/// Bounded retention cap must be positive
fn validate_retention(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    if let Some(0) = blueprint.retention.cap() {
        return Err(VerifierError::config_validation(
            "retention",
            "bounded retention cap must be > 0",
        ));
    }
    Ok(())
}

/// Consumer names unique and non-empty, queue capacities positive
fn validate_consumers(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    let mut seen = HashSet::new();
    for (idx, consumer) in blueprint.consumers.iter().enumerate() {
        if consumer.name.is_empty() {
            return Err(VerifierError::config_validation(
                format!("consumers[{idx}].name"),
                "consumer name cannot be empty",
            ));
        }
        if !seen.insert(&consumer.name) {
            return Err(VerifierError::config_validation(
                format!("consumers[name={}]", consumer.name),
                "duplicate consumer name",
            ));
        }
        if consumer.queue_capacity == 0 {
            return Err(VerifierError::config_validation(
                format!("consumers[{}].queue_capacity", consumer.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

/// Source missing indexes must fall within the produced frame range
fn validate_source(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    let source = &blueprint.source;
    for &idx in &source.missing {
        if idx >= source.frames {
            return Err(VerifierError::config_validation(
                "source.missing",
                format!(
                    "missing index {idx} out of range (source produces {} frames)",
                    source.frames
                ),
            ));
        }
    }
    if source.rows == 0 || source.cols == 0 {
        return Err(VerifierError::config_validation(
            "source.rows / source.cols",
            "frame dimensions must be > 0",
        ));
    }
    Ok(())
}

/// Status register feedback needs a detector prefix
fn validate_feedback(blueprint: &VerifierBlueprint) -> Result<(), VerifierError> {
    if let Some(feedback) = &blueprint.feedback {
        if feedback.uses_register() && feedback.detector.is_none() {
            return Err(VerifierError::config_validation(
                "feedback.detector",
                "status_register feedback requires a detector prefix",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, ConsumerConfig, ConsumerType, DataTypeConfig, FeedbackChannel,
        FeedbackConfig, RetentionPolicy, SourceConfig, Threshold, TypeLimits,
    };

    fn minimal_blueprint() -> VerifierBlueprint {
        VerifierBlueprint {
            version: ConfigVersion::V1,
            source: SourceConfig::default(),
            types: vec![DataTypeConfig {
                data_type: "data".into(),
                checks: vec![CheckKind::Mean, CheckKind::StatMean],
                limits: TypeLimits::new()
                    .with(LimitKey::Mean, Threshold::band(0.0, 200.0))
                    .with(LimitKey::StatMean, Threshold::band(-10.0, 10.0)),
            }],
            retention: RetentionPolicy::Unbounded,
            consumers: vec![ConsumerConfig {
                name: "log".into(),
                consumer_type: ConsumerType::Log,
                queue_capacity: 100,
                params: Default::default(),
            }],
            feedback: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_no_types() {
        let mut bp = minimal_blueprint();
        bp.types.clear();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("at least one data type"), "got: {err}");
    }

    #[test]
    fn test_duplicate_data_type() {
        let mut bp = minimal_blueprint();
        bp.types.push(bp.types[0].clone());
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate data_type"), "got: {err}");
    }

    #[test]
    fn test_empty_check_list() {
        let mut bp = minimal_blueprint();
        bp.types[0].checks.clear();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("check list cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_statistical_check_before_base() {
        let mut bp = minimal_blueprint();
        bp.types[0].checks = vec![CheckKind::StatMean, CheckKind::Mean];
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("must be listed after"), "got: {err}");
    }

    #[test]
    fn test_missing_threshold() {
        let mut bp = minimal_blueprint();
        bp.types[0].checks.push(CheckKind::Sum);
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("no 'sum' threshold"), "got: {err}");
    }

    #[test]
    fn test_saturation_needs_point_sat() {
        let mut bp = minimal_blueprint();
        bp.types[0].checks = vec![CheckKind::FrameSatPts];
        bp.types[0].limits = TypeLimits::new().with(
            LimitKey::FrameSatPts,
            Threshold::high(100.0),
        );
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("point_sat"), "got: {err}");
    }

    #[test]
    fn test_rate_check_needs_only_point_sat_rate() {
        // frame_sat_cnt_rate reads point_sat_rate alone; no point_sat required
        let mut bp = minimal_blueprint();
        bp.types[0].checks = vec![CheckKind::FrameSatCntRate];
        bp.types[0].limits = TypeLimits::new()
            .with(LimitKey::FrameSatCntRate, Threshold::high(100.0))
            .with(LimitKey::PointSatRate, Threshold::high(40_000.0));
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_rate_check_needs_point_sat_rate() {
        let mut bp = minimal_blueprint();
        bp.types[0].checks = vec![CheckKind::FrameSatCntRate];
        bp.types[0].limits =
            TypeLimits::new().with(LimitKey::FrameSatCntRate, Threshold::high(100.0));
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("point_sat_rate"), "got: {err}");
    }

    #[test]
    fn test_zero_retention_cap() {
        let mut bp = minimal_blueprint();
        bp.retention = RetentionPolicy::Bounded(0);
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("cap must be > 0"), "got: {err}");
    }

    #[test]
    fn test_duplicate_consumer_name() {
        let mut bp = minimal_blueprint();
        bp.consumers.push(bp.consumers[0].clone());
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate consumer name"), "got: {err}");
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut bp = minimal_blueprint();
        bp.consumers[0].queue_capacity = 0;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("queue_capacity must be > 0"), "got: {err}");
    }

    #[test]
    fn test_missing_index_out_of_range() {
        let mut bp = minimal_blueprint();
        bp.source.frames = 5;
        bp.source.missing = vec![2, 7];
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("out of range"), "got: {err}");
    }

    #[test]
    fn test_register_without_detector() {
        let mut bp = minimal_blueprint();
        bp.feedback = Some(FeedbackConfig {
            channels: vec![FeedbackChannel::StatusRegister],
            detector: None,
        });
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("detector"), "got: {err}");
    }
}
