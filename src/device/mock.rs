//! Synthetic device driver.
//!
//! `MockDevice` behaves like a real driver from the consumer's point of
//! view: it owns a capture thread that calls the registered sink, and its
//! `stop_capture` does not return while a callback is still running.
//! Tests can also act as the capture thread through a [`MockHandle`].

use super::driver::{
    DeviceDriver, DeviceError, DeviceState, TiltStatus, TILT_MAX_DEGREES, TILT_MIN_DEGREES,
};
use crate::capture::{ColorFormat, FrameSink, DEPTH_RAW_NO_VALUE};
use crate::config::{DeviceConfig, Dimensions, MockSettings};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const GRAVITY: f64 = 9.81;

/// Degrees the simulated motor moves per state update.
const TILT_STEP_DEGREES: f32 = 5.0;

/// State shared between the device, its capture thread and handles.
struct Shared {
    /// Registered sink; callbacks run under the read lock.
    sink: RwLock<Option<Arc<dyn FrameSink>>>,
    running: AtomicBool,
    callbacks: AtomicU64,
}

impl Shared {
    fn emit(&self, deliver: impl FnOnce(&dyn FrameSink)) -> bool {
        let guard = self.sink.read();
        match guard.as_ref() {
            Some(sink) => {
                deliver(sink.as_ref());
                self.callbacks.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

/// Lets a test play the role of the driver's capture thread.
#[derive(Clone)]
pub struct MockHandle {
    shared: Arc<Shared>,
}

impl MockHandle {
    /// Delivers a color payload. Returns `false` if capture is not running.
    pub fn emit_color(&self, raw: &[u8], timestamp: u32) -> bool {
        self.shared.emit(|sink| sink.on_color_payload(raw, timestamp))
    }

    /// Delivers a depth payload. Returns `false` if capture is not running.
    pub fn emit_depth(&self, raw: &[u8], timestamp: u32) -> bool {
        self.shared.emit(|sink| sink.on_depth_payload(raw, timestamp))
    }

    /// Returns true between `start_capture` and `stop_capture`.
    pub fn is_capturing(&self) -> bool {
        self.shared.sink.read().is_some()
    }

    /// Total callbacks delivered so far.
    pub fn callbacks(&self) -> u64 {
        self.shared.callbacks.load(Ordering::Relaxed)
    }
}

/// Builds synthetic payloads in the configured wire formats.
#[derive(Debug, Clone)]
struct PayloadGenerator {
    config: DeviceConfig,
    /// Per-mille of depth samples reported as "no return".
    no_return_per_mille: u64,
}

impl PayloadGenerator {
    fn depth_payload(&self, sequence: u64) -> Vec<u8> {
        let Dimensions { width, height } = self.config.depth;
        let samples: Vec<u16> = (0..height as u64)
            .flat_map(|y| (0..width as u64).map(move |x| (x, y)))
            .map(|(x, y)| {
                let hash = (x * 7919 + y * 104_729 + sequence * 31) % 1000;
                if hash < self.no_return_per_mille {
                    DEPTH_RAW_NO_VALUE
                } else {
                    // Stay inside the range every depth model maps to a distance
                    (500 + (x + y + sequence) % 500) as u16
                }
            })
            .collect();
        self.config.depth_format.encode(&samples)
    }

    fn color_payload(&self, sequence: u64) -> Vec<u8> {
        let Dimensions { width, height } = self.config.color;
        let shade = |x: u32, y: u32| -> [u8; 3] {
            [
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                (sequence % 256) as u8,
            ]
        };

        let capacity = self.config.color_format.expected_len(self.config.color);
        let mut payload = Vec::with_capacity(capacity);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = shade(x, y);
                match self.config.color_format {
                    ColorFormat::Rgb24 => payload.extend_from_slice(&[r, g, b]),
                    ColorFormat::BayerGrbg => payload.push(match (y % 2, x % 2) {
                        (0, 1) => r,
                        (1, 0) => b,
                        _ => g,
                    }),
                    ColorFormat::Uyvy => {
                        // One luma byte per pixel, chroma neutral
                        let luma = ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114)
                            / 1000) as u8;
                        payload.extend_from_slice(&[128, luma]);
                    }
                }
            }
        }
        payload
    }
}

/// Simulated tilt motor.
#[derive(Debug, Clone, Copy, Default)]
struct TiltMotor {
    current: f32,
    target: f32,
}

/// Mock driver that generates synthetic depth and color frames.
pub struct MockDevice {
    shared: Arc<Shared>,
    generator: PayloadGenerator,
    frame_interval: Option<Duration>,
    thread: Option<JoinHandle<()>>,
    motor: TiltMotor,
    fail_start: bool,
}

impl MockDevice {
    /// Creates a device matching `config` with no capture thread of its
    /// own; payloads are delivered through [`MockDevice::handle`].
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink: RwLock::new(None),
                running: AtomicBool::new(false),
                callbacks: AtomicU64::new(0),
            }),
            generator: PayloadGenerator {
                config: config.clone(),
                no_return_per_mille: 0,
            },
            frame_interval: None,
            thread: None,
            motor: TiltMotor::default(),
            fail_start: false,
        }
    }

    /// Creates a free-running device from file settings.
    pub fn from_settings(config: &DeviceConfig, settings: &MockSettings) -> Self {
        Self::new(config)
            .with_frame_interval(Duration::from_millis(settings.frame_interval_ms))
            .with_no_return_ratio(settings.no_return_ratio)
    }

    /// Runs a capture thread emitting both channels every `interval`.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Sets the fraction of depth samples generated as "no return".
    pub fn with_no_return_ratio(mut self, ratio: f64) -> Self {
        self.generator.no_return_per_mille = (ratio.clamp(0.0, 1.0) * 1000.0).round() as u64;
        self
    }

    /// Makes `start_capture` fail, for exercising error paths.
    pub fn with_start_failure(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Returns a handle that can emit payloads as the capture thread.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Builds a depth payload in the configured format.
    pub fn depth_payload(&self, sequence: u64) -> Vec<u8> {
        self.generator.depth_payload(sequence)
    }

    /// Builds a color payload in the configured format.
    pub fn color_payload(&self, sequence: u64) -> Vec<u8> {
        self.generator.color_payload(sequence)
    }

    fn spawn_capture_thread(&mut self, interval: Duration) -> Result<(), DeviceError> {
        let shared = Arc::clone(&self.shared);
        let generator = self.generator.clone();

        let thread = thread::Builder::new()
            .name("mock-capture".into())
            .spawn(move || capture_loop(shared, generator, interval))
            .map_err(|e| DeviceError::StartFailed(e.to_string()))?;

        self.thread = Some(thread);
        Ok(())
    }
}

fn capture_loop(shared: Arc<Shared>, generator: PayloadGenerator, interval: Duration) {
    let started = Instant::now();
    let mut sequence = 0u64;

    tracing::debug!(?interval, "Mock capture thread running");

    while shared.running.load(Ordering::SeqCst) {
        sequence += 1;
        // Driver ticks wrap like a 32-bit hardware counter.
        let timestamp = started.elapsed().as_micros() as u32;

        let depth = generator.depth_payload(sequence);
        shared.emit(|sink| sink.on_depth_payload(&depth, timestamp));

        let color = generator.color_payload(sequence);
        shared.emit(|sink| sink.on_color_payload(&color, timestamp));

        thread::park_timeout(interval);
    }

    tracing::debug!(frames = sequence, "Mock capture thread exiting");
}

impl DeviceDriver for MockDevice {
    fn name(&self) -> &str {
        "mock"
    }

    fn start_capture(&mut self, sink: Arc<dyn FrameSink>) -> Result<(), DeviceError> {
        if self.fail_start {
            return Err(DeviceError::StartFailed("simulated start failure".into()));
        }
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(DeviceError::StartFailed("already running".into()));
        }

        *self.shared.sink.write() = Some(sink);

        if let Some(interval) = self.frame_interval {
            if let Err(e) = self.spawn_capture_thread(interval) {
                self.shared.running.store(false, Ordering::SeqCst);
                *self.shared.sink.write() = None;
                return Err(e);
            }
        }

        tracing::info!(threaded = self.frame_interval.is_some(), "MockDevice capture started");
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), DeviceError> {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return Err(DeviceError::NotStarted);
        }

        let mut result = Ok(());
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                result = Err(DeviceError::StopFailed("capture thread panicked".into()));
            }
        }

        // Waits out callbacks still running on other threads.
        *self.shared.sink.write() = None;

        tracing::info!(
            callbacks = self.shared.callbacks.load(Ordering::Relaxed),
            "MockDevice capture stopped"
        );
        result
    }

    fn set_tilt_angle(&mut self, degrees: f32) -> Result<(), DeviceError> {
        if !degrees.is_finite() {
            return Err(DeviceError::ControlFailed(format!(
                "invalid tilt angle {degrees}"
            )));
        }
        self.motor.target = degrees.clamp(TILT_MIN_DEGREES, TILT_MAX_DEGREES);
        tracing::debug!(target = self.motor.target, "MockDevice tilt requested");
        Ok(())
    }

    fn update_state(&mut self) -> Result<DeviceState, DeviceError> {
        let delta = self.motor.target - self.motor.current;
        self.motor.current += delta.clamp(-TILT_STEP_DEGREES, TILT_STEP_DEGREES);

        let tilt_status = if self.motor.current != self.motor.target {
            TiltStatus::Moving
        } else if self.motor.current <= TILT_MIN_DEGREES || self.motor.current >= TILT_MAX_DEGREES {
            TiltStatus::AtLimit
        } else {
            TiltStatus::Stopped
        };

        let theta = f64::from(self.motor.current).to_radians();
        Ok(DeviceState {
            tilt_angle: self.motor.current,
            tilt_status,
            accelerometer: [0.0, -GRAVITY * theta.cos(), GRAVITY * theta.sin()],
        })
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        if self.shared.running.load(Ordering::SeqCst) {
            let _ = self.stop_capture();
        }
    }
}
