//! Feedback delivery loop
//!
//! Drains the feedback queue and fans each verdict out to the configured
//! channels. The loop exits once it has seen one end token per aggregate, so
//! no verdict queued before shutdown is lost.

use std::sync::Arc;

use contracts::{FeedbackChannel, FeedbackMessage, Verdict};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::register::{compose_status, StatusRegister};

/// Feedback delivery loop
pub struct FeedbackConsumer {
    rx: mpsc::UnboundedReceiver<FeedbackMessage>,
    channels: Vec<FeedbackChannel>,
    register: Option<Arc<dyn StatusRegister>>,
    expected_ends: usize,
}

impl FeedbackConsumer {
    /// Create the delivery loop
    ///
    /// `expected_ends` is the number of non-empty aggregates at shutdown; the
    /// loop stops once that many end tokens arrived.
    pub fn new(
        rx: mpsc::UnboundedReceiver<FeedbackMessage>,
        channels: Vec<FeedbackChannel>,
        register: Option<Arc<dyn StatusRegister>>,
        expected_ends: usize,
    ) -> Self {
        Self {
            rx,
            channels,
            register,
            expected_ends,
        }
    }

    /// Run until every aggregate delivered its end token
    #[instrument(name = "feedback_run", skip(self), fields(channels = self.channels.len()))]
    pub async fn run(mut self) {
        if self.expected_ends == 0 {
            return;
        }

        let mut ends_seen = 0usize;
        let mut verdicts = 0u64;

        while let Some(message) = self.rx.recv().await {
            match message {
                FeedbackMessage::Verdict(verdict) => {
                    verdicts += 1;
                    self.deliver(&verdict);
                }
                FeedbackMessage::End => {
                    ends_seen += 1;
                    debug!(ends_seen, expected = self.expected_ends, "feedback end token");
                    if ends_seen >= self.expected_ends {
                        break;
                    }
                }
            }
        }

        info!(verdicts, ends_seen, "feedback loop finished");
    }

    /// Spawn the loop as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    fn deliver(&self, verdict: &Verdict) {
        for channel in &self.channels {
            match channel {
                FeedbackChannel::Console => self.deliver_console(verdict),
                FeedbackChannel::Log => self.deliver_log(verdict),
                FeedbackChannel::StatusRegister => self.deliver_register(verdict),
            }
        }
    }

    fn deliver_console(&self, verdict: &Verdict) {
        for result in verdict.failing_results() {
            println!(
                "failed frame {} result of {} is {}",
                verdict.index, result.check, result.value
            );
        }
    }

    fn deliver_log(&self, verdict: &Verdict) {
        for result in verdict.failing_results() {
            warn!(
                data_type = %verdict.data_type,
                index = verdict.index,
                check = %result.check,
                value = result.value,
                "quality check failed"
            );
        }
    }

    fn deliver_register(&self, verdict: &Verdict) {
        let Some(register) = &self.register else {
            return;
        };
        let failing: Vec<_> = verdict.failing_results().copied().collect();
        register.write_status(&compose_status(&verdict.subject(), &failing));
        for result in &failing {
            register.increment_counter(&verdict.data_type, result.check);
            register.write_last_value(&verdict.data_type, result.check, result.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::InMemoryRegister;
    use contracts::{CheckKind, CheckResult, DataType, LimitViolation};

    fn failing_verdict(index: u64) -> Verdict {
        Verdict::new(
            DataType::new("data"),
            index,
            vec![CheckResult {
                value: 900.0,
                check: CheckKind::Mean,
                error: LimitViolation::High,
            }],
        )
    }

    #[tokio::test]
    async fn test_loop_stops_after_expected_ends() {
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = FeedbackConsumer::new(rx, vec![FeedbackChannel::Log], None, 2);
        let handle = consumer.spawn();

        tx.send(FeedbackMessage::Verdict(failing_verdict(0))).unwrap();
        tx.send(FeedbackMessage::End).unwrap();
        tx.send(FeedbackMessage::Verdict(failing_verdict(1))).unwrap();
        tx.send(FeedbackMessage::End).unwrap();

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_register_channel_updates_state() {
        let register = Arc::new(InMemoryRegister::new("BBF1"));
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = FeedbackConsumer::new(
            rx,
            vec![FeedbackChannel::StatusRegister],
            Some(register.clone()),
            1,
        );
        let handle = consumer.spawn();

        tx.send(FeedbackMessage::Verdict(failing_verdict(5))).unwrap();
        tx.send(FeedbackMessage::End).unwrap();
        handle.await.unwrap();

        let snapshot = register.snapshot();
        assert_eq!(snapshot.counters["data_mean"], 1);
        assert_eq!(snapshot.last_values["data_mean"], 900.0);
        assert!(snapshot.status.contains("failed mean with result 900"));
    }

    #[tokio::test]
    async fn test_loop_stops_on_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel::<FeedbackMessage>();
        let consumer = FeedbackConsumer::new(rx, vec![], None, 5);
        let handle = consumer.spawn();

        drop(tx);
        handle.await.unwrap();
    }
}
