//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        types = blueprint.types.len(),
        consumers = blueprint.consumers.len(),
        retention = ?blueprint.retention,
        feedback = blueprint.has_feedback(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");

    let outcome: PipelineOutcome = pipeline.run().await.context("Pipeline execution failed")?;

    info!(
        frames_passed = outcome.stats.frames_passed,
        frames_failed = outcome.stats.frames_failed,
        duration_secs = outcome.stats.duration.as_secs_f64(),
        fps = format!("{:.2}", outcome.stats.fps()),
        "Pipeline completed successfully"
    );

    // Print detailed statistics
    outcome.stats.print_summary();

    // Persist the report when requested
    if let Some(ref path) = args.report {
        let json = serde_json::to_string_pretty(&outcome.report)
            .context("Failed to serialize verification report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Verification report written");
    }

    info!("Frameguard finished");
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::VerifierBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!(
        "  {} frames of {}x{} ({})",
        blueprint.source.frames,
        blueprint.source.rows,
        blueprint.source.cols,
        blueprint.source.data_type
    );
    println!("\nTypes ({}):", blueprint.types.len());
    for type_cfg in &blueprint.types {
        println!(
            "  - {} - {} checks",
            type_cfg.data_type,
            type_cfg.checks.len()
        );
    }
    println!("\nRetention: {:?}", blueprint.retention);

    if !blueprint.consumers.is_empty() {
        println!("\nConsumers ({}):", blueprint.consumers.len());
        for consumer in &blueprint.consumers {
            println!("  - {} ({:?})", consumer.name, consumer.consumer_type);
        }
    }

    if let Some(ref feedback) = blueprint.feedback {
        println!("\nFeedback channels: {:?}", feedback.channels);
        if let Some(ref detector) = feedback.detector {
            println!("  Detector prefix: {}", detector);
        }
    }

    println!();
}
