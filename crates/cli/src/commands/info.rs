//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    retention: String,
    types: Vec<TypeInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    consumers: Vec<ConsumerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<FeedbackInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    frames: u64,
    rows: usize,
    cols: usize,
    data_type: String,
    missing: Vec<u64>,
}

#[derive(Serialize)]
struct TypeInfo {
    data_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checks: Vec<CheckInfo>,
    check_count: usize,
}

#[derive(Serialize)]
struct CheckInfo {
    check: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    low_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    high_limit: Option<f64>,
}

#[derive(Serialize)]
struct ConsumerInfo {
    name: String,
    consumer_type: String,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct FeedbackInfo {
    channels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detector: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::VerifierBlueprint, args: &InfoArgs) -> ConfigInfo {
    let mut types: Vec<TypeInfo> = Vec::new();
    for type_cfg in &blueprint.types {
        let checks = if args.checks {
            type_cfg
                .checks
                .iter()
                .map(|&check| {
                    let threshold = type_cfg.limits.get(check.into());
                    CheckInfo {
                        check: check.to_string(),
                        low_limit: threshold.and_then(|t| t.low_limit),
                        high_limit: threshold.and_then(|t| t.high_limit),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        types.push(TypeInfo {
            data_type: type_cfg.data_type.to_string(),
            checks,
            check_count: type_cfg.checks.len(),
        });
    }

    let consumers = if args.consumers {
        blueprint
            .consumers
            .iter()
            .map(|c| ConsumerInfo {
                name: c.name.clone(),
                consumer_type: format!("{:?}", c.consumer_type),
                queue_capacity: c.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    let feedback = blueprint.feedback.as_ref().map(|f| FeedbackInfo {
        channels: f.channels.iter().map(|c| format!("{:?}", c)).collect(),
        detector: f.detector.clone(),
    });

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source: SourceInfo {
            frames: blueprint.source.frames,
            rows: blueprint.source.rows,
            cols: blueprint.source.cols,
            data_type: blueprint.source.data_type.to_string(),
            missing: blueprint.source.missing.clone(),
        },
        retention: format!("{:?}", blueprint.retention),
        types,
        consumers,
        feedback,
    }
}

fn print_config_info(blueprint: &contracts::VerifierBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Frameguard Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Source info
    println!("📍 Source");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Stream: {} frames of {}x{}",
        blueprint.source.frames, blueprint.source.rows, blueprint.source.cols
    );
    println!("   ├─ Data type: {}", blueprint.source.data_type);
    if blueprint.source.missing.is_empty() {
        println!("   └─ Missing frames: none");
    } else {
        println!("   └─ Missing frames: {:?}", blueprint.source.missing);
    }

    // Types
    println!("\n🔬 Types ({})", blueprint.types.len());
    for (i, type_cfg) in blueprint.types.iter().enumerate() {
        let is_last = i == blueprint.types.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {}", prefix, type_cfg.data_type);

        if args.checks && !type_cfg.checks.is_empty() {
            println!(
                "   {}  📋 Checks ({}):",
                child_prefix,
                type_cfg.checks.len()
            );
            for (j, &check) in type_cfg.checks.iter().enumerate() {
                let check_is_last = j == type_cfg.checks.len() - 1;
                let check_prefix = if check_is_last { "└─" } else { "├─" };
                let threshold = type_cfg.limits.get(check.into());
                println!(
                    "   {}     {} {} (low: {:?}, high: {:?})",
                    child_prefix,
                    check_prefix,
                    check,
                    threshold.and_then(|t| t.low_limit),
                    threshold.and_then(|t| t.high_limit)
                );
            }
        } else {
            println!("   {}  └─ {} checks", child_prefix, type_cfg.checks.len());
        }
    }

    // Retention
    println!("\n⚙️  Retention: {:?}", blueprint.retention);

    // Consumers
    if !blueprint.consumers.is_empty() {
        println!("\n📤 Consumers ({})", blueprint.consumers.len());
        for (i, consumer) in blueprint.consumers.iter().enumerate() {
            let is_last = i == blueprint.consumers.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.consumers {
                println!(
                    "   {} {} ({:?}, queue {})",
                    prefix, consumer.name, consumer.consumer_type, consumer.queue_capacity
                );
            } else {
                println!("   {} {} ({:?})", prefix, consumer.name, consumer.consumer_type);
            }
        }
    }

    // Feedback
    if let Some(ref feedback) = blueprint.feedback {
        println!("\n📣 Feedback");
        println!("   ├─ Channels: {:?}", feedback.channels);
        match feedback.detector {
            Some(ref detector) => println!("   └─ Detector prefix: {}", detector),
            None => println!("   └─ Detector prefix: (none)"),
        }
    }

    println!();
}
