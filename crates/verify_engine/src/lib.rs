//! Frame quality verification engine
//!
//! The engine sits between ingestion and the consumer sinks. A single
//! handler task drains the frame channel, evaluates the configured quality
//! checks per data type, retains verdicts in per-type aggregates and
//! publishes a final report when the end token arrives.
//!
//! - [`checks`] — per-check evaluation and limit comparison
//! - [`dispatch`] — ordered check list execution for one frame
//! - [`aggregate`] — per-type retention and feedback forwarding
//! - [`handler`] — the frame loop and its lifecycle
//! - [`report`] — end-of-stream report assembly

pub mod aggregate;
pub mod checks;
pub mod dispatch;
pub mod handler;
pub mod report;

pub use aggregate::Aggregate;
pub use checks::{evaluate, find_result, CheckContext, CheckHistory, PartialResults};
pub use dispatch::run_quality_checks;
pub use handler::FrameHandler;
pub use report::{Report, ReportEntry};
