//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `VerifierBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Types: {}", blueprint.types.len());
//! ```

mod parser;
mod validator;

pub use contracts::VerifierBlueprint;
pub use parser::ConfigFormat;

use contracts::VerifierError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<VerifierBlueprint, VerifierError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<VerifierBlueprint, VerifierError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize VerifierBlueprint to TOML string
    pub fn to_toml(blueprint: &VerifierBlueprint) -> Result<String, VerifierError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| VerifierError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize VerifierBlueprint to JSON string
    pub fn to_json(blueprint: &VerifierBlueprint) -> Result<String, VerifierError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| VerifierError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, VerifierError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            VerifierError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            VerifierError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, VerifierError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<VerifierBlueprint, VerifierError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[source]
frames = 6
rows = 8
cols = 8
data_type = "data"

[[types]]
data_type = "data"
checks = ["mean", "st_dev", "stat_mean"]

[types.limits.mean]
low_limit = 0.0
high_limit = 200.0

[types.limits.st_dev]
high_limit = 50.0

[types.limits.stat_mean]
low_limit = -10.0
high_limit = 10.0

[[consumers]]
name = "log_consumer"
consumer_type = "log"

[feedback]
channels = ["console"]
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.types[0].data_type.as_str(), "data");
        assert_eq!(bp.source.frames, 6);
        assert!(bp.has_feedback());
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.types.len(), bp2.types.len());
        assert_eq!(bp.types[0].checks, bp2.types[0].checks);
        assert_eq!(bp.consumers[0].name, bp2.consumers[0].name);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.types[0].data_type, bp2.types[0].data_type);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Statistical check listed before its base check must fail validation
        let content = r#"
[[types]]
data_type = "data"
checks = ["stat_mean", "mean"]

[types.limits.mean]
high_limit = 100.0

[types.limits.stat_mean]
high_limit = 5.0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be listed after"));
    }
}
