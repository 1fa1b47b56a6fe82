//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    retention: String,
    type_count: usize,
    check_count: usize,
    consumer_count: usize,
    feedback_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let check_count: usize = blueprint.types.iter().map(|t| t.checks.len()).sum();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    retention: format!("{:?}", blueprint.retention),
                    type_count: blueprint.types.len(),
                    check_count,
                    consumer_count: blueprint.consumers.len(),
                    feedback_enabled: blueprint.has_feedback(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::VerifierBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // Check for empty consumers
    if blueprint.consumers.is_empty() {
        warnings.push("No consumers configured - verified frames will be dropped".to_string());
    }

    // Forward retention without feedback throws every verdict away
    if blueprint.retention.is_forward() && !blueprint.has_feedback() {
        warnings.push(
            "Retention is 'forward' but no feedback is configured - verdicts will be discarded"
                .to_string(),
        );
    }

    // Frames of an unconfigured data type abort the run
    if blueprint
        .type_config(&blueprint.source.data_type)
        .is_none()
    {
        warnings.push(format!(
            "Source data type '{}' has no check configuration - frames will be rejected",
            blueprint.source.data_type
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        CheckKind, DataTypeConfig, LimitKey, RetentionPolicy, Threshold, TypeLimits,
        VerifierBlueprint,
    };

    fn blueprint_for(source_type: &str) -> VerifierBlueprint {
        VerifierBlueprint {
            version: Default::default(),
            source: contracts::SourceConfig {
                data_type: source_type.into(),
                ..Default::default()
            },
            types: vec![DataTypeConfig {
                data_type: "data".into(),
                checks: vec![CheckKind::Mean],
                limits: TypeLimits::new().with(LimitKey::Mean, Threshold::band(0.0, 200.0)),
            }],
            retention: RetentionPolicy::Unbounded,
            consumers: vec![],
            feedback: None,
        }
    }

    #[test]
    fn test_warns_on_unconfigured_source_type() {
        let warnings = collect_warnings(&blueprint_for("data_dark"));
        assert!(warnings.iter().any(|w| w.contains("data_dark")));
    }

    #[test]
    fn test_no_source_warning_when_type_configured() {
        let warnings = collect_warnings(&blueprint_for("data"));
        assert!(!warnings.iter().any(|w| w.contains("no check configuration")));
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Retention: {}", summary.retention);
            println!("  Types: {}", summary.type_count);
            println!("  Checks: {}", summary.check_count);
            println!("  Consumers: {}", summary.consumer_count);
            println!("  Feedback: {}", summary.feedback_enabled);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
