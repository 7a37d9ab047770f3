//! # Real-Time Controller
//!
//! Tracks whether high-frequency sampling is enabled and at which interval,
//! recomputes both from backend status feedback, and publishes interval
//! changes to every running scheduler.
//!
//! ## Usage Example
//!
//! ```ignore
//! let controller = Arc::new(RealTimeController::new(DEFAULT_REAL_TIME_INTERVAL));
//! let state = controller.state();
//! let mut interval_rx = controller.subscribe(); // one per scheduler
//!
//! controller.update(&statuses);
//! if state.is_enabled() { /* run real-time checks */ }
//! ```

mod controller;
mod state;

pub use controller::{RealTimeController, RealTimeUpdate, DEFAULT_REAL_TIME_INTERVAL};
pub use state::RealTimeState;
