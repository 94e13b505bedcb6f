//! Metrics collection and registry.

use crate::acquisition::{AcquisitionStats, SessionState};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

const CHANNELS: [&str; 2] = ["color", "depth"];

/// Prometheus metrics registry for frame acquisition.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    running: IntGauge,
    sessions_total: IntCounter,

    // Per-channel metrics, labelled by `channel`
    captured_total: IntCounterVec,
    rejected_total: IntCounterVec,
    delivered_total: IntCounterVec,
    overwritten_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new registry with all acquisition metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let running = IntGauge::new(
            "depth_bridge_running",
            "Current session state (1=running, 0=stopped)",
        )?;
        let sessions_total = IntCounter::new(
            "depth_bridge_sessions_total",
            "Total number of capture sessions started",
        )?;

        let captured_total = IntCounterVec::new(
            Opts::new(
                "depth_bridge_frames_captured_total",
                "Payloads converted and published by the capture thread",
            ),
            &["channel"],
        )?;
        let rejected_total = IntCounterVec::new(
            Opts::new(
                "depth_bridge_payloads_rejected_total",
                "Payloads dropped because their size did not match the channel",
            ),
            &["channel"],
        )?;
        let delivered_total = IntCounterVec::new(
            Opts::new(
                "depth_bridge_frames_delivered_total",
                "Frames handed to the consumer",
            ),
            &["channel"],
        )?;
        let overwritten_total = IntCounterVec::new(
            Opts::new(
                "depth_bridge_frames_overwritten_total",
                "Unread frames replaced by a newer capture",
            ),
            &["channel"],
        )?;

        registry.register(Box::new(running.clone()))?;
        registry.register(Box::new(sessions_total.clone()))?;
        registry.register(Box::new(captured_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(delivered_total.clone()))?;
        registry.register(Box::new(overwritten_total.clone()))?;

        // Make every series visible before the first update
        for channel in CHANNELS {
            captured_total.with_label_values(&[channel]);
            rejected_total.with_label_values(&[channel]);
            delivered_total.with_label_values(&[channel]);
            overwritten_total.with_label_values(&[channel]);
        }

        Ok(Self {
            registry,
            running,
            sessions_total,
            captured_total,
            rejected_total,
            delivered_total,
            overwritten_total,
        })
    }

    /// Updates all metrics from a statistics snapshot.
    pub fn update(&self, stats: &AcquisitionStats) {
        self.running.set(i64::from(stats.state == SessionState::Running));
        advance(&self.sessions_total, stats.sessions);

        let per_channel = [
            (
                "color",
                stats.capture.color_frames,
                stats.capture.color_rejected,
                stats.store.color,
            ),
            (
                "depth",
                stats.capture.depth_frames,
                stats.capture.depth_rejected,
                stats.store.depth,
            ),
        ];

        for (channel, captured, rejected, buffer) in per_channel {
            advance(&self.captured_total.with_label_values(&[channel]), captured);
            advance(&self.rejected_total.with_label_values(&[channel]), rejected);
            advance(&self.delivered_total.with_label_values(&[channel]), buffer.reads);
            advance(&self.overwritten_total.with_label_values(&[channel]), buffer.overwritten);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Counters only move forward; increment by the difference to `total`.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureStats;
    use crate::frame::{BufferStats, StoreStats};

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let stats = AcquisitionStats {
            state: SessionState::Running,
            sessions: 1,
            capture: CaptureStats {
                color_frames: 10,
                depth_frames: 12,
                color_rejected: 0,
                depth_rejected: 2,
            },
            store: StoreStats {
                color: BufferStats {
                    writes: 10,
                    reads: 7,
                    overwritten: 3,
                },
                depth: BufferStats {
                    writes: 12,
                    reads: 12,
                    overwritten: 0,
                },
            },
        };

        registry.update(&stats);
        // A second identical update must not double count
        registry.update(&stats);

        let output = registry.encode().unwrap();
        assert!(output.contains("depth_bridge_running 1"));
        assert!(output.contains("depth_bridge_sessions_total 1"));
        assert!(output.contains("depth_bridge_frames_captured_total{channel=\"depth\"} 12"));
        assert!(output.contains("depth_bridge_frames_overwritten_total{channel=\"color\"} 3"));
        assert!(output.contains("depth_bridge_payloads_rejected_total{channel=\"depth\"} 2"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("depth_bridge_running"));
        assert!(output.contains("depth_bridge_frames_delivered_total{channel=\"color\"} 0"));
    }
}
