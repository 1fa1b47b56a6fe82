//! Configuration parsing
//!
//! Supports TOML (primary) and JSON formats.

use contracts::{VerifierBlueprint, VerifierError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<VerifierBlueprint, VerifierError> {
    toml::from_str(content).map_err(|e| VerifierError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<VerifierBlueprint, VerifierError> {
    serde_json::from_str(content).map_err(|e| VerifierError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<VerifierBlueprint, VerifierError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CheckKind;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[types]]
data_type = "data"
checks = ["mean", "st_dev"]

[types.limits.mean]
low_limit = 0.0
high_limit = 200.0

[types.limits.st_dev]
high_limit = 50.0

[[consumers]]
name = "log_consumer"
consumer_type = "log"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.types.len(), 1);
        assert_eq!(bp.types[0].checks, vec![CheckKind::Mean, CheckKind::StDev]);
        assert_eq!(bp.consumers.len(), 1);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "types": [{
                "data_type": "data",
                "checks": ["mean"],
                "limits": { "mean": { "low_limit": 0.0, "high_limit": 100.0 } }
            }],
            "retention": "forward",
            "consumers": [{ "name": "log", "consumer_type": "log" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, VerifierError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
