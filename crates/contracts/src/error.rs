//! Layered error definitions
//!
//! Categorized by source: config / evaluation / sink / channel

use thiserror::Error;

use crate::{CheckKind, LimitKey};

/// Unified error type
#[derive(Debug, Error)]
pub enum VerifierError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Evaluation Errors =====
    // Not recovered locally: a failing check evaluation terminates the run.
    /// Sample array shape does not match its element count
    #[error("slice shape mismatch: {rows}x{cols} declared, {len} samples")]
    SliceShape { rows: usize, cols: usize, len: usize },

    /// A frame attribute required by a check is absent
    #[error("frame attribute '{attribute}' required by check '{check}' is missing")]
    AttributeMissing { attribute: String, check: CheckKind },

    /// No threshold configured for a check that needs one
    #[error("no '{key}' limits configured for data type '{data_type}'")]
    LimitMissing { data_type: String, key: LimitKey },

    /// A statistical check ran before its base check
    #[error("check '{check}' needs the result of '{requires}' from the same frame")]
    DependencyMissing { check: CheckKind, requires: CheckKind },

    /// A frame arrived with a data type no aggregate was configured for
    #[error("no quality checks configured for data type '{data_type}'")]
    UnknownDataType { data_type: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// A channel peer went away mid-run
    #[error("channel '{channel}' closed unexpectedly")]
    ChannelClosed { channel: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl VerifierError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing-limit evaluation error
    pub fn limit_missing(data_type: impl Into<String>, key: LimitKey) -> Self {
        Self::LimitMissing {
            data_type: data_type.into(),
            key,
        }
    }

    /// Create missing-attribute evaluation error
    pub fn attribute_missing(attribute: impl Into<String>, check: CheckKind) -> Self {
        Self::AttributeMissing {
            attribute: attribute.into(),
            check,
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create closed-channel error
    pub fn channel_closed(channel: impl Into<String>) -> Self {
        Self::ChannelClosed {
            channel: channel.into(),
        }
    }
}
