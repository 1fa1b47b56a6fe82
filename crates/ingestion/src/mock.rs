//! Synthetic frame source
//!
//! Produces a scripted stream of data frames, missing-frame tokens and a
//! trailing end token. Used for pipeline tests and dry runs without a live
//! detector.

use std::collections::VecDeque;

use contracts::{attrs, Frame, FrameData, FrameSource, Slice, SourceConfig};
use tracing::trace;

/// Synthetic frame source
///
/// Frame `i` carries sample value `base_value + i * value_step`, rotation
/// angle `i * theta_step` and file name `frame_{i:05}`. Indexes listed in
/// `missing` yield a missing token instead of data. An end token follows the
/// last frame.
pub struct MockFrameSource {
    config: SourceConfig,
    next_index: u64,
    end_sent: bool,
    script: Option<VecDeque<Frame>>,
}

impl MockFrameSource {
    /// Create a source driven by the given configuration
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            next_index: 0,
            end_sent: false,
            script: None,
        }
    }

    /// Create a source replaying a fixed frame sequence verbatim
    pub fn from_script(frames: Vec<Frame>) -> Self {
        Self {
            config: SourceConfig::default(),
            next_index: 0,
            end_sent: false,
            script: Some(frames.into()),
        }
    }

    fn synthesize(&self, index: u64) -> Frame {
        if self.config.missing.contains(&index) {
            return Frame::Missing;
        }
        let value = self.config.base_value + index as f64 * self.config.value_step;
        let slice = Slice::filled(self.config.rows, self.config.cols, value);
        let data = FrameData::new(self.config.data_type.clone(), slice)
            .with_attr(attrs::THETA, index as f64 * self.config.theta_step)
            .with_attr(attrs::ACQ_TIME, self.config.acq_time)
            .with_attr(attrs::FILE_NAME, format!("frame_{index:05}"));
        Frame::Data(data)
    }
}

impl FrameSource for MockFrameSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if let Some(script) = &mut self.script {
            return script.pop_front();
        }

        if self.next_index < self.config.frames {
            let frame = self.synthesize(self.next_index);
            trace!(index = self.next_index, "synthesized frame");
            self.next_index += 1;
            return Some(frame);
        }

        if !self.end_sent {
            self.end_sent = true;
            return Some(Frame::End);
        }

        None
    }
}
