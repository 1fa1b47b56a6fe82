//! VerifierBlueprint - Config Loader output
//!
//! Describes a complete verification run: frame source, per-data-type checks
//! and limits, retention, consumer sinks, feedback channels.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{CheckKind, DataType, TypeLimits};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete verification run blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Frame source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Per-data-type check configuration
    pub types: Vec<DataTypeConfig>,

    /// Aggregate retention policy, shared by all data types
    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Consumer sink routing
    #[serde(default)]
    pub consumers: Vec<ConsumerConfig>,

    /// Real-time feedback settings (optional)
    #[serde(default)]
    pub feedback: Option<FeedbackConfig>,
}

impl VerifierBlueprint {
    /// Configuration for one data type, if present
    pub fn type_config(&self, data_type: &DataType) -> Option<&DataTypeConfig> {
        self.types.iter().find(|t| &t.data_type == data_type)
    }

    /// True if a feedback channel is configured
    pub fn has_feedback(&self) -> bool {
        self.feedback
            .as_ref()
            .is_some_and(|f| !f.channels.is_empty())
    }
}

/// Checks and limits for one data type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTypeConfig {
    /// The data type tag frames carry
    pub data_type: DataType,

    /// Checks to run, in order. Order matters: a statistical check must come
    /// after the base check whose same-frame result it reads.
    pub checks: Vec<CheckKind>,

    /// Threshold table for this type
    #[serde(default)]
    pub limits: TypeLimits,
}

/// Aggregate retention policy
///
/// Replaces the `-1` sentinel of ad-hoc verifier configs with a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// No retention: forward every verdict to feedback immediately, keep no
    /// per-index state and no history
    Forward,

    /// Retain every verdict and the full history
    #[default]
    Unbounded,

    /// Retain at most this many entries per index map and per check history,
    /// evicting oldest first
    Bounded(usize),
}

impl RetentionPolicy {
    /// True for the no-retention mode
    pub fn is_forward(&self) -> bool {
        matches!(self, RetentionPolicy::Forward)
    }

    /// Retention cap, when bounded
    pub fn cap(&self) -> Option<usize> {
        match self {
            RetentionPolicy::Bounded(cap) => Some(*cap),
            _ => None,
        }
    }
}

/// Consumer sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Sink name
    pub name: String,

    /// Sink kind
    pub consumer_type: ConsumerType,

    /// Worker queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Kind-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Consumer sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerType {
    /// Log each verified frame
    Log,
    /// Append verdict records to a JSONL file
    File,
    /// Stream two-part frame messages over UDP
    Network,
}

/// Feedback delivery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Enabled feedback channels
    #[serde(default)]
    pub channels: Vec<FeedbackChannel>,

    /// Detector prefix for the status register channel
    #[serde(default)]
    pub detector: Option<String>,
}

impl FeedbackConfig {
    /// True if the status register channel is enabled
    pub fn uses_register(&self) -> bool {
        self.channels.contains(&FeedbackChannel::StatusRegister)
    }
}

/// One feedback delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackChannel {
    /// Print one line per failing check result
    Console,
    /// Log one line per failing check result
    Log,
    /// Write composed status text and failure counters to the status register
    StatusRegister,
}

/// Synthetic frame source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Number of data frames to produce before the end token
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// Slice rows
    #[serde(default = "default_dim")]
    pub rows: usize,

    /// Slice columns
    #[serde(default = "default_dim")]
    pub cols: usize,

    /// Data type tag stamped on every frame
    #[serde(default = "default_data_type")]
    pub data_type: DataType,

    /// Source-side indexes reported as missing instead of data
    #[serde(default)]
    pub missing: Vec<u64>,

    /// Sample value of frame 0
    #[serde(default = "default_base_value")]
    pub base_value: f64,

    /// Per-frame sample value increment
    #[serde(default)]
    pub value_step: f64,

    /// Per-frame rotation angle increment (degrees)
    #[serde(default = "default_theta_step")]
    pub theta_step: f64,

    /// Acquisition time attribute stamped on every frame (seconds)
    #[serde(default = "default_acq_time")]
    pub acq_time: f64,
}

fn default_frames() -> u64 {
    10
}

fn default_dim() -> usize {
    16
}

fn default_data_type() -> DataType {
    DataType::new("data")
}

fn default_base_value() -> f64 {
    100.0
}

fn default_theta_step() -> f64 {
    0.5
}

fn default_acq_time() -> f64 {
    0.1
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            rows: default_dim(),
            cols: default_dim(),
            data_type: default_data_type(),
            missing: Vec::new(),
            base_value: default_base_value(),
            value_step: 0.0,
            theta_step: default_theta_step(),
            acq_time: default_acq_time(),
        }
    }
}
