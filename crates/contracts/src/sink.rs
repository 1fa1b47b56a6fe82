//! ConsumerSink trait - implemented by Consumers crate sinks

use crate::{VerifiedFrame, VerifierError};

/// A consumer sink receiving verified frames.
///
/// Each sink runs on its own worker task, so `write` takes `&mut self`.
/// `finish` is called exactly once, after the last frame, when the end token
/// reaches the sink's queue.
#[trait_variant::make(ConsumerSink: Send)]
pub trait LocalConsumerSink {
    /// Sink name, for logging and metrics labels
    fn name(&self) -> &str;

    /// Deliver one verified frame
    async fn write(&mut self, frame: &VerifiedFrame) -> Result<(), VerifierError>;

    /// Signal end of stream to the downstream endpoint
    async fn finish(&mut self) -> Result<(), VerifierError>;

    /// Release resources
    async fn close(&mut self) -> Result<(), VerifierError>;
}
