//! Frame - ingestion stream unit
//!
//! One element of the detector stream: a data frame, a missing-frame
//! placeholder, or the end-of-stream token.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use bytes::Bytes;

use crate::{DataType, VerifierError};

/// Well-known frame attribute names supplied by upstream feed decorators.
pub mod attrs {
    /// Rotation angle at acquisition time (degrees)
    pub const THETA: &str = "theta";
    /// Detector acquisition/exposure time (seconds)
    pub const ACQ_TIME: &str = "acq_time";
    /// Source file name the frame was read from
    pub const FILE_NAME: &str = "file_name";
}

/// One unit of the ingestion stream.
///
/// `Missing` marks a frame dropped upstream: it advances the index counter so
/// index alignment with the source survives, but is otherwise skipped. `End`
/// is the unique completion token fanned out to every downstream consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Frame {
    /// A detector frame with its sample array and attributes
    Data(FrameData),
    /// Placeholder for a frame lost before ingestion
    Missing,
    /// End-of-stream token
    End,
}

impl Frame {
    /// True for the `End` variant
    pub fn is_end(&self) -> bool {
        matches!(self, Frame::End)
    }
}

/// Payload of a `Frame::Data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameData {
    /// Data type tag (selects the aggregate, checks and limits)
    pub data_type: DataType,

    /// 2D sample array
    pub slice: Slice,

    /// Open, named attribute bag filled by feed decorators
    #[serde(default)]
    pub attributes: FrameAttributes,
}

impl FrameData {
    /// Create frame data without attributes
    pub fn new(data_type: impl Into<DataType>, slice: Slice) -> Self {
        Self {
            data_type: data_type.into(),
            slice,
            attributes: FrameAttributes::default(),
        }
    }

    /// Attach an attribute, builder style
    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name, value);
        self
    }
}

/// 2D numeric sample array
///
/// Row-major `f64` storage. The constructor enforces that the declared shape
/// matches the element count; a mismatch is an evaluation error and fatal to
/// the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Slice {
    /// Create a slice from row-major samples
    ///
    /// # Errors
    /// Returns `VerifierError::SliceShape` if `rows * cols != data.len()`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, VerifierError> {
        if rows * cols != data.len() {
            return Err(VerifierError::SliceShape {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a slice with every sample set to `value`
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Shape as `[rows, cols]`
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Total sample count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the slice holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw samples, row-major
    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    /// Arithmetic mean of all samples (0 for an empty slice)
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as f64
    }

    /// Population standard deviation of all samples
    pub fn std_dev(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / self.data.len() as f64;
        var.sqrt()
    }

    /// Sum of all samples
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Number of samples strictly above `threshold`
    pub fn count_above(&self, threshold: f64) -> usize {
        self.data.iter().filter(|v| **v > threshold).count()
    }

    /// Flattened little-endian byte payload for the consumer wire protocol
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.data.len() * 8);
        for v in &self.data {
            out.extend_from_slice(&v.to_le_bytes());
        }
        Bytes::from(out)
    }
}

/// A single named frame attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Integer attribute (frame counters etc.)
    Int(i64),
    /// Floating point attribute (angles, exposure times)
    Float(f64),
    /// Text attribute (file names)
    Text(String),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Ordered bag of named scalar attributes attached to a frame
///
/// Kept as a small ordered map rather than free-form dynamic fields so the
/// frame type stays statically shaped while feed decorators can still attach
/// per-detector entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameAttributes(BTreeMap<String, AttrValue>);

impl FrameAttributes {
    /// Create an empty attribute bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute
    pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Look up an attribute
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Numeric attribute as f64 (integers coerce)
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(AttrValue::Float(v)) => Some(*v),
            Some(AttrValue::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text attribute
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(AttrValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no attributes are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate attributes in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_shape_checked() {
        assert!(Slice::new(2, 3, vec![0.0; 6]).is_ok());
        let err = Slice::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, VerifierError::SliceShape { len: 5, .. }));
    }

    #[test]
    fn test_slice_statistics() {
        let s = Slice::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.sum(), 10.0);
        assert_eq!(s.mean(), 2.5);
        // population std dev of 1..4 is sqrt(1.25)
        assert!((s.std_dev() - 1.25_f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.count_above(2.5), 2);
    }

    #[test]
    fn test_slice_to_bytes_little_endian() {
        let s = Slice::new(1, 2, vec![1.0, -2.0]).unwrap();
        let bytes = s.to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &1.0_f64.to_le_bytes());
        assert_eq!(&bytes[8..], &(-2.0_f64).to_le_bytes());
    }

    #[test]
    fn test_attributes_typed_access() {
        let mut attrs = FrameAttributes::new();
        attrs.insert(attrs::THETA, 90.5);
        attrs.insert(attrs::FILE_NAME, "frame_00012");
        attrs.insert("counter", 12_i64);

        assert_eq!(attrs.float(attrs::THETA), Some(90.5));
        assert_eq!(attrs.float("counter"), Some(12.0));
        assert_eq!(attrs.text(attrs::FILE_NAME), Some("frame_00012"));
        assert_eq!(attrs.float(attrs::FILE_NAME), None);
        assert_eq!(attrs.text("missing"), None);
    }

    #[test]
    fn test_frame_data_builder() {
        let frame = FrameData::new("data", Slice::filled(4, 4, 1.0))
            .with_attr(attrs::ACQ_TIME, 0.1)
            .with_attr(attrs::THETA, 0.0);
        assert_eq!(frame.data_type, "data");
        assert_eq!(frame.attributes.len(), 2);
    }
}
