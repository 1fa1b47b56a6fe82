//! FrameSource trait - implemented by Ingestion crate sources

use crate::Frame;

/// A pull-based frame source.
///
/// Object safe so the pipeline can hold `Box<dyn FrameSource>`. Returning
/// `None` means the source is exhausted without having produced an explicit
/// end token; the pipeline injects `Frame::End` in that case.
pub trait FrameSource: Send {
    /// Source name, for logging
    fn name(&self) -> &str;

    /// Produce the next frame, or `None` when exhausted
    fn next_frame(&mut self) -> Option<Frame>;
}
