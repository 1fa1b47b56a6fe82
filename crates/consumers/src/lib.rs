//! # Consumers
//!
//! Verified-frame delivery module.
//!
//! Responsibilities:
//! - Fan-out `VerifiedFrame`s to consumer sinks
//! - Isolate slow sinks behind bounded worker queues (at-most-once delivery)
//! - Deliver exactly one end token per sink at end of stream

pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{ConsumerSink, SinkMessage, VerifiedFrame};
pub use error::ConsumerError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileConsumer, LogConsumer, NetworkConsumer};

use contracts::{ConsumerConfig, ConsumerType};
use tracing::instrument;

/// Create a SinkHandle from configuration
#[instrument(
    name = "consumer_create_handle",
    skip(config),
    fields(consumer = %config.name, consumer_type = ?config.consumer_type)
)]
pub async fn create_consumer_handle(config: &ConsumerConfig) -> Result<SinkHandle, ConsumerError> {
    match config.consumer_type {
        ConsumerType::Log => {
            let sink = LogConsumer::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        ConsumerType::File => {
            let sink = FileConsumer::from_params(&config.name, &config.params)
                .map_err(|e| ConsumerError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        ConsumerType::Network => {
            let sink = NetworkConsumer::from_params(&config.name, &config.params)
                .await
                .map_err(|e| ConsumerError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Create SinkHandles for every configured consumer
#[instrument(
    name = "consumer_create_handles",
    skip(configs),
    fields(consumer_count = configs.len())
)]
pub async fn create_consumer_handles(
    configs: &[ConsumerConfig],
) -> Result<Vec<SinkHandle>, ConsumerError> {
    let mut handles = Vec::with_capacity(configs.len());
    for config in configs {
        handles.push(create_consumer_handle(config).await?);
    }
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_create_log_handle_from_config() {
        let config = ConsumerConfig {
            name: "test_log".to_string(),
            consumer_type: ConsumerType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        };

        let handle = create_consumer_handle(&config).await.unwrap();
        assert_eq!(handle.name(), "test_log");
        handle.send_end().await;
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_create_handles_for_all_configs() {
        let configs = vec![
            ConsumerConfig {
                name: "a".to_string(),
                consumer_type: ConsumerType::Log,
                queue_capacity: 10,
                params: HashMap::new(),
            },
            ConsumerConfig {
                name: "b".to_string(),
                consumer_type: ConsumerType::Log,
                queue_capacity: 10,
                params: HashMap::new(),
            },
        ];

        let handles = create_consumer_handles(&configs).await.unwrap();
        assert_eq!(handles.len(), 2);
        for handle in handles {
            handle.send_end().await;
            handle.shutdown().await;
        }
    }
}
