//! Channel message types and the consumer wire header
//!
//! End-of-stream is a dedicated variant on every channel rather than a magic
//! value compared by content, so completion handling is exhaustively checked.

use serde::{Deserialize, Serialize};

use crate::{Verdict, VerifiedFrame};

/// Message delivered to a consumer sink worker
#[derive(Debug, Clone)]
pub enum SinkMessage {
    /// A verified frame to forward
    Frame(VerifiedFrame),
    /// End token: the sink finishes and shuts down after this
    End,
}

/// Message delivered to the feedback consumer
///
/// The handler enqueues one `End` per configured aggregate so the feedback
/// consumer can detect completion without a shared counter.
#[derive(Debug, Clone)]
pub enum FeedbackMessage {
    /// Verdict for one frame
    Verdict(Verdict),
    /// One per-aggregate end token
    End,
}

/// Structured header of the two-part consumer message
///
/// Sent as JSON, followed by the flattened sample array as raw bytes. A
/// terminal header with `key = "end"` and no binary part signals End.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Message kind: `image` or `end`
    pub key: String,

    /// Element dtype of the binary part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,

    /// Array shape `[rows, cols]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<[usize; 2]>,

    /// Verification flag: true when the frame passed all checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<bool>,

    /// Handler-assigned frame index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_number: Option<u64>,

    /// Rotation angle attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,

    /// Free-text note for protocol peers
    pub document: String,
}

impl FrameHeader {
    /// Header for a verified data frame
    pub fn image(frame: &VerifiedFrame) -> Self {
        Self {
            key: "image".to_string(),
            dtype: Some("float64".to_string()),
            shape: Some(frame.data.slice.shape()),
            ver: Some(frame.passed),
            image_number: Some(frame.index),
            theta: Some(frame.theta()),
            document: "... see next message ...".to_string(),
        }
    }

    /// Terminal header signalling end of transmission
    pub fn end() -> Self {
        Self {
            key: "end".to_string(),
            dtype: None,
            shape: None,
            ver: None,
            image_number: None,
            theta: None,
            document: "... end of transmission ...".to_string(),
        }
    }

    /// True for the terminal header
    pub fn is_end(&self) -> bool {
        self.key == "end"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frame::attrs, FrameData, Slice};

    #[test]
    fn test_image_header_fields() {
        let frame = VerifiedFrame {
            index: 42,
            passed: false,
            data: FrameData::new("data", Slice::filled(3, 4, 1.0))
                .with_attr(attrs::THETA, 12.5),
        };
        let header = FrameHeader::image(&frame);
        assert_eq!(header.key, "image");
        assert_eq!(header.dtype.as_deref(), Some("float64"));
        assert_eq!(header.shape, Some([3, 4]));
        assert_eq!(header.ver, Some(false));
        assert_eq!(header.image_number, Some(42));
        assert_eq!(header.theta, Some(12.5));
        assert!(!header.is_end());
    }

    #[test]
    fn test_end_header_has_no_payload_fields() {
        let header = FrameHeader::end();
        assert!(header.is_end());
        let json = serde_json::to_string(&header).unwrap();
        assert!(!json.contains("shape"));
        assert!(!json.contains("image_number"));
    }
}
