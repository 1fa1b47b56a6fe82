//! Pipeline orchestrator - coordinates all components.
//!
//! Wires the mock frame source, the frame handler, the consumer sinks and
//! the feedback channel together, then drives the run to its final report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::VerifierBlueprint;
use feedback::{FeedbackConsumer, InMemoryRegister, StatusRegister};
use ingestion::{IngestionPipeline, MockFrameSource};
use tokio::sync::mpsc;
use tracing::{info, warn};
use verify_engine::{FrameHandler, Report};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The verifier blueprint configuration
    pub blueprint: VerifierBlueprint,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Frame channel capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Outcome of a completed run
pub struct PipelineOutcome {
    /// Final report built from the non-empty aggregates
    pub report: Report,

    /// Run statistics
    pub stats: PipelineStats,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineOutcome> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup Ingestion
        info!("Setting up ingestion pipeline...");
        let mut ingestion = IngestionPipeline::new(self.config.buffer_size);
        let frame_rx = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;
        let ingestion_metrics = ingestion.metrics();

        let source = MockFrameSource::new(blueprint.source.clone());

        // Setup Consumers
        if blueprint.consumers.is_empty() {
            warn!("No consumers configured - verified frames will be dropped");
        }
        let handles = consumers::create_consumer_handles(&blueprint.consumers)
            .await
            .context("Failed to create consumer sinks")?;
        let active_consumers = handles.len();
        info!(active_consumers, "Consumer sinks started");

        // Setup Feedback (optional)
        let (feedback_tx, feedback_handle) = if blueprint.has_feedback() {
            let (tx, rx) = mpsc::unbounded_channel();
            let feedback_cfg = blueprint
                .feedback
                .as_ref()
                .context("feedback marked enabled without a feedback section")?;

            let register: Option<Arc<dyn StatusRegister>> = if feedback_cfg.uses_register() {
                let detector = feedback_cfg
                    .detector
                    .clone()
                    .context("status_register channel without a detector prefix")?;
                Some(Arc::new(InMemoryRegister::new(detector)))
            } else {
                None
            };

            let consumer = FeedbackConsumer::new(
                rx,
                feedback_cfg.channels.clone(),
                register,
                blueprint.types.len(),
            );
            info!(channels = feedback_cfg.channels.len(), "Feedback enabled");
            (Some(tx), Some(consumer.spawn()))
        } else {
            (None, None)
        };

        // Setup Handler
        let handler = FrameHandler::from_blueprint(blueprint, frame_rx, handles, feedback_tx);
        let mut report_rx = handler.spawn();

        // Start Pipeline
        info!(frames = blueprint.source.frames, "Starting frame ingestion...");
        ingestion.start(Box::new(source));

        // Run until the report arrives, a shutdown signal fires, or the
        // timeout elapses. A signal only requests the end token; the handler
        // still drains and publishes its report.
        let deadline = self.config.timeout;
        let report_result = tokio::select! {
            result = &mut report_rx => result,
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, requesting end of stream...");
                ingestion.stop();
                report_rx.await
            }
            _ = sleep_or_forever(deadline) => {
                warn!(timeout_secs = deadline.map(|d| d.as_secs()), "Pipeline timed out, requesting end of stream...");
                ingestion.stop();
                report_rx.await
            }
        };

        let report = report_result
            .context("Frame handler dropped without publishing a report")?
            .context("Frame handler failed")?;

        // Shutdown
        info!("Shutting down pipeline...");
        ingestion.join().await;
        if let Some(handle) = feedback_handle {
            if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
                warn!("Feedback consumer did not drain within 5s");
            }
        }

        let ingestion_snapshot = ingestion_metrics.snapshot();
        let stats = PipelineStats {
            frames_emitted: ingestion_snapshot.frames_emitted,
            frames_missing: ingestion_snapshot.missing_emitted,
            frames_passed: report.passed_frames() as u64,
            frames_failed: report.failed_frames() as u64,
            duration: start_time.elapsed(),
            active_consumers,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(PipelineOutcome { report, stats })
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Sleep for the duration, or pend forever when no timeout is set
async fn sleep_or_forever(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
