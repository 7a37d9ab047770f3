//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the agent: checks and
//! their output, payloads, the forwarder interface, backend status records
//! and the agent configuration.
//! All business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Weight Model
//! - A queued `CheckResult` weighs the sum of its encoded payload bodies
//! - Queues bound both item count and total weight

mod check;
mod config;
mod error;
mod forwarder;
mod message;
mod names;
mod payload;
mod status;

pub use check::*;
pub use config::*;
pub use error::*;
pub use forwarder::*;
pub use message::*;
pub use names::{check_names, headers};
pub use payload::*;
pub use status::*;
