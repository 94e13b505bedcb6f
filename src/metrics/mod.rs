//! Prometheus metrics exporter for frame acquisition.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `depth_bridge_running` - Current session state (1=running, 0=stopped)
//! - `depth_bridge_sessions_total` - Capture sessions started
//!
//! ## Channel Metrics (label `channel` = `color` | `depth`)
//! - `depth_bridge_frames_captured_total` - Payloads converted and published
//! - `depth_bridge_payloads_rejected_total` - Payloads with a mismatched size
//! - `depth_bridge_frames_delivered_total` - Frames read by the consumer
//! - `depth_bridge_frames_overwritten_total` - Frames dropped by last-write-wins
//!
//! # Example
//!
//! ```no_run
//! use depth_bridge::{Acquisition, DeviceConfig, MockDevice};
//! use depth_bridge::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let config = DeviceConfig::default();
//! let acquisition = Acquisition::new(MockDevice::new(&config), config).unwrap();
//!
//! registry.update(&acquisition.stats());
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
