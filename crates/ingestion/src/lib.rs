//! # Ingestion
//!
//! Frame acquisition module.
//!
//! Responsibilities:
//! - Pull frames from a `FrameSource` into a bounded frame channel
//! - Apply backpressure without dropping frames
//! - Guarantee the stream terminates with an end token
//!
//! The channel receiver feeds the verification engine's handler loop.

mod config;
mod mock;
mod pipeline;

pub use config::{IngestionMetrics, MetricsSnapshot};
pub use mock::MockFrameSource;
pub use pipeline::IngestionPipeline;
