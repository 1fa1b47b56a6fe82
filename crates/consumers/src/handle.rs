//! SinkHandle - manages a consumer sink with isolated queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ConsumerSink, SinkMessage, VerifiedFrame};

use crate::metrics::SinkMetrics;

/// Handle to a running consumer worker
///
/// Frame delivery is at-most-once: a full queue drops the frame rather than
/// stalling the verification loop. The end token is delivered reliably, so a
/// slow sink never loses the end of stream.
pub struct SinkHandle {
    /// Consumer name
    name: String,
    /// Channel to send messages to worker
    tx: mpsc::Sender<SinkMessage>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: ConsumerSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get consumer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Send a verified frame to the consumer (non-blocking)
    ///
    /// Returns true if queued, false if the queue was full (frame dropped)
    pub fn forward(&self, frame: VerifiedFrame) -> bool {
        match self.tx.try_send(SinkMessage::Frame(frame)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                self.metrics.inc_frames_dropped();
                if let SinkMessage::Frame(f) = msg {
                    warn!(
                        consumer = %self.name,
                        index = f.index,
                        "Queue full, frame dropped"
                    );
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(consumer = %self.name, "Consumer worker closed unexpectedly");
                false
            }
        }
    }

    /// Deliver the end token (blocking until queued)
    ///
    /// Unlike `forward`, this waits for queue space. Every consumer sees
    /// exactly one end token per run.
    pub async fn send_end(&self) {
        if self.tx.send(SinkMessage::End).await.is_err() {
            error!(consumer = %self.name, "Consumer worker gone before end token");
        }
    }

    /// Shutdown the consumer worker gracefully
    #[instrument(name = "sink_handle_shutdown", skip(self))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        // Wait for worker to finish
        if let Err(e) = self.worker_handle.await {
            error!(consumer = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(consumer = %self.name, "SinkHandle shutdown complete");
    }
}

/// Worker task that consumes messages and drives the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(consumer = %name)
)]
async fn sink_worker<S: ConsumerSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<SinkMessage>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(consumer = %name, "Consumer worker started");

    while let Some(msg) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match msg {
            SinkMessage::Frame(frame) => match sink.write(&frame).await {
                Ok(()) => {
                    metrics.inc_frames_written();
                }
                Err(e) => {
                    metrics.inc_write_failures();
                    error!(
                        consumer = %name,
                        index = frame.index,
                        error = %e,
                        "Write failed"
                    );
                    // Continue processing - don't crash on single failure
                }
            },
            SinkMessage::End => {
                if let Err(e) = sink.finish().await {
                    error!(consumer = %name, error = %e, "Finish failed");
                } else {
                    metrics.mark_end_delivered();
                }
                break;
            }
        }
    }

    if let Err(e) = sink.close().await {
        error!(consumer = %name, error = %e, "Close failed on shutdown");
    }

    debug!(consumer = %name, "Consumer worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DataType, FrameData, Slice, VerifierError};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        finish_count: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl ConsumerSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _frame: &VerifiedFrame) -> Result<(), VerifierError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(VerifierError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn finish(&mut self) -> Result<(), VerifierError> {
            self.finish_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), VerifierError> {
            Ok(())
        }
    }

    fn mock_sink(name: &str) -> (MockSink, Arc<AtomicU64>, Arc<AtomicU64>) {
        let write_count = Arc::new(AtomicU64::new(0));
        let finish_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: name.to_string(),
            write_count: Arc::clone(&write_count),
            finish_count: Arc::clone(&finish_count),
            should_fail: false,
            delay_ms: 0,
        };
        (sink, write_count, finish_count)
    }

    fn verified(index: u64) -> VerifiedFrame {
        VerifiedFrame {
            index,
            passed: true,
            data: FrameData::new(DataType::new("data"), Slice::filled(2, 2, 1.0)),
        }
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let (sink, write_count, finish_count) = mock_sink("test");
        let handle = SinkHandle::spawn(sink, 10);

        for i in 0..5 {
            assert!(handle.forward(verified(i)));
        }
        handle.send_end().await;

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert_eq!(finish_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_sink_handle_queue_full() {
        let (mut sink, _, _) = mock_sink("slow");
        sink.delay_ms = 100;

        // Small queue capacity
        let handle = SinkHandle::spawn(sink, 2);

        // Send more than queue can hold
        for i in 0..10 {
            handle.forward(verified(i));
        }

        // Some should have been dropped
        assert!(handle.metrics().frames_dropped() > 0);

        handle.send_end().await;
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let (mut sink, _, finish_count) = mock_sink("failing");
        sink.should_fail = true;

        let handle = SinkHandle::spawn(sink, 10);

        for i in 0..3 {
            handle.forward(verified(i));
        }
        handle.send_end().await;

        // Give worker time to process
        sleep(Duration::from_millis(50)).await;

        // Write failures never block the end token
        assert!(handle.metrics().write_failures() > 0);
        handle.shutdown().await;
        assert_eq!(finish_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_end_token_delivered_once() {
        let (sink, _, finish_count) = mock_sink("end");
        let handle = SinkHandle::spawn(sink, 4);

        handle.forward(verified(0));
        handle.send_end().await;
        handle.shutdown().await;

        assert_eq!(finish_count.load(Ordering::Relaxed), 1);
    }
}
