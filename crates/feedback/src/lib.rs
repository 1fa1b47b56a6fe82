//! # Feedback
//!
//! Real-time verdict delivery module.
//!
//! Responsibilities:
//! - Drain the feedback queue filled by the verification loop
//! - Fan each verdict out to console, log and status register channels
//! - Stop only after every aggregate delivered its end token

mod consumer;
mod register;

pub use consumer::FeedbackConsumer;
pub use contracts::{FeedbackChannel, FeedbackMessage};
pub use register::{
    compose_status, InMemoryRegister, RegisterSnapshot, StatusRegister, STATUS_CAPACITY,
};
