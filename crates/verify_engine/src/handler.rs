//! Frame handler loop
//!
//! A single task drains the ingestion channel, runs the quality checks,
//! fans verified frames out to the consumer sinks and retains verdicts in
//! the per-type aggregates. Being the only task that touches the
//! aggregates keeps the whole verification path lock-free.

use std::collections::HashMap;

use async_channel::Receiver;
use consumers::SinkHandle;
use contracts::{
    CheckKind, DataType, FeedbackMessage, Frame, TypeLimits, Verdict, VerifiedFrame,
    VerifierBlueprint, VerifierError,
};
use observability::VerdictStatsAggregator;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregate;
use crate::dispatch::run_quality_checks;
use crate::report::Report;

/// Check list, limits and retained state for one configured data type
struct TypeState {
    checks: Vec<CheckKind>,
    limits: TypeLimits,
    aggregate: Aggregate,
}

/// Drains frames from the ingestion channel until the end token arrives.
///
/// Lifecycle: Running (frames flow) -> Draining (end token fan-out) ->
/// Terminated (report published). A closed ingestion channel without an
/// end token counts as end of stream.
pub struct FrameHandler {
    rx: Receiver<Frame>,
    consumers: Vec<SinkHandle>,
    types: HashMap<DataType, TypeState>,
    next_index: u64,
    stats: VerdictStatsAggregator,
}

impl FrameHandler {
    /// Wire a handler from the validated blueprint.
    ///
    /// Each configured data type gets its own aggregate; when a feedback
    /// sender is supplied every aggregate holds a clone of it.
    pub fn from_blueprint(
        blueprint: &VerifierBlueprint,
        rx: Receiver<Frame>,
        consumers: Vec<SinkHandle>,
        feedback: Option<mpsc::UnboundedSender<FeedbackMessage>>,
    ) -> Self {
        let types = blueprint
            .types
            .iter()
            .map(|cfg| {
                let aggregate = Aggregate::new(
                    cfg.data_type.clone(),
                    blueprint.retention,
                    feedback.clone(),
                );
                let state = TypeState {
                    checks: cfg.checks.clone(),
                    limits: cfg.limits.clone(),
                    aggregate,
                };
                (cfg.data_type.clone(), state)
            })
            .collect();

        Self {
            rx,
            consumers,
            types,
            next_index: 0,
            stats: VerdictStatsAggregator::new(),
        }
    }

    /// Next handler-assigned frame index
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Run until the end token, then drain and publish the report.
    ///
    /// A check evaluation error or an unconfigured data type terminates the
    /// run with the error; acquisition is expected to halt on it.
    pub async fn run(mut self) -> Result<Report, VerifierError> {
        info!(
            types = self.types.len(),
            consumers = self.consumers.len(),
            "frame handler running"
        );

        loop {
            match self.rx.recv().await {
                Ok(Frame::Data(data)) => {
                    let verdict = self.verify_frame(&data)?;
                    self.fan_out(VerifiedFrame {
                        index: verdict.index,
                        passed: !verdict.failed,
                        data,
                    });
                    self.retain(verdict);
                    self.next_index += 1;
                }
                Ok(Frame::Missing) => {
                    debug!(index = self.next_index, "missing frame, index advanced");
                    observability::record_missing_frame();
                    self.stats.record_missing();
                    self.next_index += 1;
                }
                Ok(Frame::End) => {
                    info!(frames = self.next_index, "end token received, draining");
                    break;
                }
                Err(_) => {
                    warn!("ingestion channel closed without end token, draining");
                    break;
                }
            }
        }

        self.drain().await
    }

    /// Spawn the loop on the runtime; the report arrives on the returned
    /// oneshot exactly once.
    pub fn spawn(self) -> oneshot::Receiver<Result<Report, VerifierError>> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = self.run().await;
            if tx.send(result).is_err() {
                warn!("report receiver dropped before the run finished");
            }
        });
        rx
    }

    fn verify_frame(&mut self, data: &contracts::FrameData) -> Result<Verdict, VerifierError> {
        let index = self.next_index;
        let state = self
            .types
            .get_mut(&data.data_type)
            .ok_or_else(|| VerifierError::UnknownDataType {
                data_type: data.data_type.to_string(),
            })?;

        let verdict =
            run_quality_checks(data, index, &state.checks, &state.limits, &state.aggregate)?;
        observability::record_verdict(&verdict);
        self.stats.update(&verdict);
        Ok(verdict)
    }

    fn fan_out(&self, frame: VerifiedFrame) {
        for handle in &self.consumers {
            let accepted = handle.forward(frame.clone());
            observability::record_frame_forwarded(handle.name(), accepted);
        }
    }

    fn retain(&mut self, verdict: Verdict) {
        if let Some(state) = self.types.get_mut(&verdict.data_type) {
            if state.aggregate.will_forward(verdict.failed) {
                observability::record_feedback_sent(verdict.data_type.as_str());
            }
            state.aggregate.handle_results(verdict);
        }
    }

    /// End-token fan-out and shutdown, then the final report
    async fn drain(mut self) -> Result<Report, VerifierError> {
        for handle in &self.consumers {
            handle.send_end().await;
        }
        for state in self.types.values_mut() {
            state.aggregate.end();
        }

        let report = Report::from_aggregates(self.types.values().map(|s| &s.aggregate));

        for handle in self.consumers.drain(..) {
            handle.shutdown().await;
        }

        info!("{}", self.stats.summary());
        Ok(report)
    }
}
