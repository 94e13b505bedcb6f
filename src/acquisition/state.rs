//! Session state, errors and statistics.

use crate::capture::CaptureStats;
use crate::config::ConfigError;
use crate::device::DeviceError;
use crate::frame::StoreStats;
use thiserror::Error;

/// Lifecycle of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No capture thread; no callbacks will fire.
    #[default]
    Stopped,
    /// Capture thread active; callbacks may fire at any time.
    Running,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Running => f.write_str("running"),
        }
    }
}

/// Errors surfaced by the acquisition facade.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The driver refused a request.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    /// The request needs a running session.
    #[error("acquisition is not running")]
    NotRunning,
}

/// Combined counters for both sides of the hand-off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Current session state.
    pub state: SessionState,
    /// Completed `start` transitions.
    pub sessions: u64,
    /// Capture-side counters.
    pub capture: CaptureStats,
    /// Buffer counters per channel.
    pub store: StoreStats,
}
