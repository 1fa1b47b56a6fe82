//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Index Model
//! - Frame index is assigned by the handler loop as a monotonically increasing
//!   counter, incremented for every consumed frame including `Missing`, so it
//!   stays aligned with the source's native frame numbering.

mod blueprint;
mod check;
mod data_type;
mod error;
mod frame;
mod message;
mod sink;
mod source;
mod verdict;

pub use blueprint::*;
pub use check::*;
pub use data_type::DataType;
pub use error::*;
pub use frame::*;
pub use message::*;
pub use sink::*;
pub use source::FrameSource;
pub use verdict::*;
