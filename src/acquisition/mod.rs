//! Acquisition lifecycle and polling reads.
//!
//! ```text
//! driver capture thread ─▶ CaptureCallbackHandler ─▶ DualChannelStore
//!                                                        │
//!                      consumer thread ◀─ Acquisition ◀──┘
//! ```

mod facade;
mod state;

pub use facade::Acquisition;
pub use state::{AcquisitionError, AcquisitionStats, SessionState};
