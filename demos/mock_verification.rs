//! Mock Verification Demo
//!
//! Runs the full verification pipeline against the synthetic frame source.
//! No detector or control system is required.
//!
//! Run with: cargo run -p mock_verification [config.toml]

use std::collections::HashMap;

use config_loader::ConfigLoader;
use contracts::{
    CheckKind, ConsumerConfig, ConsumerType, DataType, DataTypeConfig, FeedbackChannel,
    FeedbackConfig, LimitKey, RetentionPolicy, SourceConfig, Threshold, TypeLimits,
    VerifierBlueprint,
};
use feedback::FeedbackConsumer;
use ingestion::{IngestionPipeline, MockFrameSource};
use tokio::sync::mpsc;
use verify_engine::FrameHandler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Verification Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Create a minimal test blueprint
        create_test_blueprint()
    };

    // ==== Stage 2: Setup Consumers ====
    tracing::info!("Creating consumer sinks...");
    let handles = consumers::create_consumer_handles(&blueprint.consumers).await?;
    tracing::info!(consumers = handles.len(), "Consumer sinks started");

    // ==== Stage 3: Setup Feedback ====
    let (feedback_tx, feedback_handle) = if blueprint.has_feedback() {
        let (tx, rx) = mpsc::unbounded_channel();
        let channels = blueprint
            .feedback
            .as_ref()
            .map(|f| f.channels.clone())
            .unwrap_or_default();
        let consumer = FeedbackConsumer::new(rx, channels, None, blueprint.types.len());
        (Some(tx), Some(consumer.spawn()))
    } else {
        (None, None)
    };

    // ==== Stage 4: Setup Ingestion and Handler ====
    tracing::info!("Setting up ingestion pipeline...");
    let mut ingestion = IngestionPipeline::new(100);
    let frame_rx = ingestion.take_receiver().unwrap();

    let handler = FrameHandler::from_blueprint(&blueprint, frame_rx, handles, feedback_tx);
    let report_rx = handler.spawn();

    // ==== Stage 5: Run ====
    tracing::info!(frames = blueprint.source.frames, "Starting frame stream...");
    ingestion.start(Box::new(MockFrameSource::new(blueprint.source.clone())));

    let report = report_rx.await??;
    ingestion.join().await;
    if let Some(handle) = feedback_handle {
        handle.await?;
    }

    // ==== Stage 6: Report ====
    tracing::info!(
        passed = report.passed_frames(),
        failed = report.failed_frames(),
        "Verification complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// A small stream with one missing frame and a drifting signal, so the demo
/// shows passing frames, a failing stat_mean and a missing-frame gap.
fn create_test_blueprint() -> VerifierBlueprint {
    let limits = TypeLimits::new()
        .with(LimitKey::Mean, Threshold::band(0.0, 1000.0))
        .with(LimitKey::StDev, Threshold::high(50.0))
        .with(LimitKey::Sum, Threshold::band(0.0, 300_000.0))
        .with(LimitKey::StatMean, Threshold::band(-25.0, 25.0));

    VerifierBlueprint {
        version: Default::default(),
        source: SourceConfig {
            frames: 10,
            missing: vec![4],
            value_step: 12.0,
            ..Default::default()
        },
        types: vec![DataTypeConfig {
            data_type: DataType::new("data"),
            checks: vec![
                CheckKind::Mean,
                CheckKind::StDev,
                CheckKind::Sum,
                CheckKind::StatMean,
            ],
            limits,
        }],
        retention: RetentionPolicy::Unbounded,
        consumers: vec![ConsumerConfig {
            name: "log".to_string(),
            consumer_type: ConsumerType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }],
        feedback: Some(FeedbackConfig {
            channels: vec![FeedbackChannel::Console, FeedbackChannel::Log],
            detector: None,
        }),
    }
}
