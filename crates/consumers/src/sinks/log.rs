//! LogConsumer - logs verified frame summaries via tracing

use contracts::{ConsumerSink, VerifiedFrame, VerifierError};
use tracing::{info, instrument};

/// Consumer that logs verified frame summaries for debugging
pub struct LogConsumer {
    name: String,
}

impl LogConsumer {
    /// Create a new LogConsumer with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_frame_summary(&self, frame: &VerifiedFrame) {
        let [rows, cols] = frame.data.slice.shape();

        info!(
            consumer = %self.name,
            index = frame.index,
            data_type = %frame.data.data_type,
            passed = frame.passed,
            theta = frame.theta(),
            rows,
            cols,
            "Verified frame received"
        );
    }
}

impl ConsumerSink for LogConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_consumer_write",
        skip(self, frame),
        fields(consumer = %self.name, index = frame.index)
    )]
    async fn write(&mut self, frame: &VerifiedFrame) -> Result<(), VerifierError> {
        self.log_frame_summary(frame);
        Ok(())
    }

    #[instrument(name = "log_consumer_finish", skip(self))]
    async fn finish(&mut self) -> Result<(), VerifierError> {
        info!(consumer = %self.name, "End of stream");
        Ok(())
    }

    #[instrument(name = "log_consumer_close", skip(self))]
    async fn close(&mut self) -> Result<(), VerifierError> {
        info!(consumer = %self.name, "LogConsumer closed");
        Ok(())
    }
}
