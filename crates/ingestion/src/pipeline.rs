//! Ingestion Pipeline main entry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{Frame, FrameSource};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::IngestionMetrics;

/// Ingestion Pipeline
///
/// Drains one frame source into a bounded frame channel. The channel applies
/// backpressure rather than dropping: every produced frame reaches the
/// receiver, and the stream always terminates with an end token.
pub struct IngestionPipeline {
    /// Frame sender
    tx: Sender<Frame>,

    /// Frame receiver
    rx: Option<Receiver<Frame>>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Producer run flag
    running: Arc<AtomicBool>,

    /// Producer task handle
    producer: Option<JoinHandle<()>>,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Frame channel capacity
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity);

        Self {
            tx,
            rx: Some(rx),
            metrics: Arc::new(IngestionMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
            producer: None,
        }
    }

    /// Start draining the given source
    ///
    /// Spawns the producer task. An exhausted source (returning `None` without
    /// an explicit end token) and an external `stop()` both terminate the
    /// stream with an injected end token.
    #[instrument(name = "ingestion_start", skip(self, source), fields(source = source.name()))]
    pub fn start(&mut self, mut source: Box<dyn FrameSource>) {
        let tx = self.tx.clone();
        let metrics = self.metrics.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        info!(source = source.name(), "ingestion started");

        self.producer = Some(tokio::spawn(async move {
            loop {
                if !running.load(Ordering::Relaxed) {
                    debug!("ingestion stopped, injecting end token");
                    let _ = tx.send(Frame::End).await;
                    break;
                }

                match source.next_frame() {
                    Some(frame) => {
                        match &frame {
                            Frame::Data(_) => metrics.record_frame(),
                            Frame::Missing => metrics.record_missing(),
                            Frame::End => {}
                        }
                        let is_end = frame.is_end();
                        if tx.send(frame).await.is_err() {
                            warn!("frame channel closed before end of stream");
                            break;
                        }
                        metrics.update_queue_len(tx.len());
                        if is_end {
                            debug!("end token forwarded");
                            break;
                        }
                    }
                    None => {
                        debug!("source exhausted, injecting end token");
                        let _ = tx.send(Frame::End).await;
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        }));
    }

    /// Request the producer to stop after the current frame
    ///
    /// The producer still delivers a final end token, so downstream drains
    /// cleanly.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for the producer task to finish
    pub async fn join(&mut self) {
        if let Some(handle) = self.producer.take() {
            let _ = handle.await;
        }
    }

    /// Get frame stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<Frame>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Check if the producer is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFrameSource;
    use contracts::SourceConfig;

    #[test]
    fn test_take_receiver_once() {
        let mut pipeline = IngestionPipeline::new(100);
        assert!(pipeline.take_receiver().is_some());
        assert!(pipeline.take_receiver().is_none());
    }

    #[tokio::test]
    async fn test_stream_terminates_with_end() {
        let mut pipeline = IngestionPipeline::new(16);
        let rx = pipeline.take_receiver().unwrap();

        let source = MockFrameSource::new(SourceConfig {
            frames: 4,
            missing: vec![2],
            ..Default::default()
        });
        pipeline.start(Box::new(source));

        let mut frames = Vec::new();
        while let Ok(frame) = rx.recv().await {
            let is_end = frame.is_end();
            frames.push(frame);
            if is_end {
                break;
            }
        }
        pipeline.join().await;

        assert_eq!(frames.len(), 5);
        assert!(matches!(frames[2], Frame::Missing));
        assert!(frames.last().is_some_and(Frame::is_end));

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.frames_emitted, 3);
        assert_eq!(snapshot.missing_emitted, 1);
    }

    #[tokio::test]
    async fn test_stop_injects_end() {
        let mut pipeline = IngestionPipeline::new(16);
        let rx = pipeline.take_receiver().unwrap();

        // Scripted source that never yields an end token on its own
        let source = MockFrameSource::from_script(vec![]);
        pipeline.start(Box::new(source));
        pipeline.join().await;

        // Exhausted script still terminates the stream
        let frame = rx.recv().await.unwrap();
        assert!(frame.is_end());
    }
}
