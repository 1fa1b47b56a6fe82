//! Consumer error types

use thiserror::Error;

/// Consumer-specific errors
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Sink creation error
    #[error("failed to create consumer '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Queue full - frame dropped
    #[error("queue full for consumer '{sink_name}', frame {index} dropped")]
    QueueFull { sink_name: String, index: u64 },

    /// Sink write error (from contract)
    #[error("consumer error: {0}")]
    Contract(#[from] contracts::VerifierError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsumerError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
