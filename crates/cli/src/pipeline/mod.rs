//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, PipelineOutcome};
pub use stats::PipelineStats;
