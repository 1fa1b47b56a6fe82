//! Consumer sink implementations
//!
//! Contains LogConsumer, FileConsumer, and NetworkConsumer.

mod file;
mod log;
mod network;

pub use self::file::{FileConsumer, FileConsumerConfig};
pub use self::log::LogConsumer;
pub use self::network::{NetworkConsumer, NetworkConsumerConfig};
