//! Consumer-facing polling API.

use super::state::{AcquisitionError, AcquisitionStats, SessionState};
use crate::capture::{CaptureCallbackHandler, FrameSink};
use crate::config::{DeviceConfig, IntrinsicParameters};
use crate::device::{DeviceDriver, DeviceState};
use crate::frame::{ColorFrame, ColorImage, DepthFrame, DistanceMap, DualChannelStore, ValidityMap};
use parking_lot::Mutex;
use std::sync::Arc;

/// Driver plus lifecycle state, always accessed together.
struct Session<D> {
    driver: D,
    state: SessionState,
    sessions: u64,
}

/// Bridges a callback-driven device driver to a polling consumer.
///
/// Control calls (`start`, `stop`, `set_tilt_angle`, `update_state`) are
/// serialized by a session lock. Reads only touch the per-channel frame
/// buffers, so they never wait on control calls or on each other across
/// channels.
///
/// # Example
///
/// ```no_run
/// use depth_bridge::{Acquisition, DeviceConfig, MockDevice};
/// use depth_bridge::frame::{ColorImage, DistanceMap, ValidityMap};
///
/// let config = DeviceConfig::default();
/// let device = MockDevice::new(&config);
/// let acquisition = Acquisition::new(device, config).unwrap();
///
/// acquisition.start().unwrap();
/// let mut distance = DistanceMap::new(640, 480);
/// let mut validity = ValidityMap::new(640, 480);
/// let mut color = ColorImage::new(640, 480);
/// for _ in 0..100 {
///     let _ = acquisition.update_state();
///     acquisition.get_depth_map(&mut distance, &mut validity);
///     acquisition.get_rgb(&mut color);
/// }
/// acquisition.stop();
/// ```
pub struct Acquisition<D: DeviceDriver> {
    config: DeviceConfig,
    handler: Arc<CaptureCallbackHandler>,
    session: Mutex<Session<D>>,
}

impl<D: DeviceDriver> Acquisition<D> {
    /// Creates a stopped acquisition around `driver`.
    ///
    /// Channel geometry and payload formats are fixed here, before any
    /// callback can fire.
    pub fn new(driver: D, config: DeviceConfig) -> Result<Self, AcquisitionError> {
        config.validate()?;

        let store = Arc::new(DualChannelStore::new(
            config.color.width,
            config.color.height,
            config.depth.width,
            config.depth.height,
        ));
        let handler = Arc::new(CaptureCallbackHandler::new(store, &config));

        tracing::debug!(
            device = driver.name(),
            color = ?config.color,
            depth = ?config.depth,
            "Acquisition created"
        );

        Ok(Self {
            config,
            handler,
            session: Mutex::new(Session {
                driver,
                state: SessionState::Stopped,
                sessions: 0,
            }),
        })
    }

    /// Starts the driver's capture thread. Does nothing if already running.
    ///
    /// A driver failure leaves the session stopped.
    pub fn start(&self) -> Result<(), AcquisitionError> {
        let mut session = self.session.lock();
        if session.state == SessionState::Running {
            tracing::debug!("start() ignored: already running");
            return Ok(());
        }

        let sink: Arc<dyn FrameSink> = self.handler.clone();
        session.driver.start_capture(sink)?;
        session.state = SessionState::Running;
        session.sessions += 1;

        tracing::info!(
            device = session.driver.name(),
            session = session.sessions,
            "Acquisition started"
        );
        Ok(())
    }

    /// Stops the capture thread. Does nothing if already stopped.
    ///
    /// On return no callback is running and none will fire until the next
    /// `start`. Driver errors are logged, not returned.
    pub fn stop(&self) {
        let mut session = self.session.lock();
        if session.state == SessionState::Stopped {
            tracing::debug!("stop() ignored: already stopped");
            return;
        }

        if let Err(e) = session.driver.stop_capture() {
            tracing::warn!(error = %e, "Driver reported an error while stopping");
        }
        session.state = SessionState::Stopped;

        tracing::info!(device = session.driver.name(), "Acquisition stopped");
    }

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        self.session.lock().state
    }

    /// Returns true between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Requests a tilt angle in degrees. Driver errors are logged.
    pub fn set_tilt_angle(&self, degrees: f32) {
        let mut session = self.session.lock();
        if let Err(e) = session.driver.set_tilt_angle(degrees) {
            tracing::warn!(error = %e, degrees, "Tilt request failed");
        }
    }

    /// Polls the driver for motor and accelerometer state.
    ///
    /// Fails with [`AcquisitionError::NotRunning`] outside a session. Holds
    /// the session lock, so it cannot overlap a concurrent `stop`.
    pub fn update_state(&self) -> Result<DeviceState, AcquisitionError> {
        let mut session = self.session.lock();
        if session.state != SessionState::Running {
            return Err(AcquisitionError::NotRunning);
        }
        Ok(session.driver.update_state()?)
    }

    /// Copies the latest unread depth frame into the caller's maps.
    ///
    /// Returns `false`, leaving both maps untouched, when no depth frame
    /// arrived since the last successful read.
    pub fn get_depth_map(&self, distance: &mut DistanceMap, validity: &mut ValidityMap) -> bool {
        self.handler.store().read_depth_with(|frame| {
            distance.clone_from(&frame.distance);
            validity.clone_from(&frame.validity);
        })
    }

    /// Copies the latest unread color image into `color`.
    ///
    /// Returns `false`, leaving `color` untouched, when no color frame
    /// arrived since the last successful read.
    pub fn get_rgb(&self, color: &mut ColorImage) -> bool {
        self.handler.store().read_color_with(|frame| color.clone_from(&frame.image))
    }

    /// Like [`get_depth_map`](Self::get_depth_map), including timestamp and sequence.
    pub fn get_depth_frame(&self, out: &mut DepthFrame) -> bool {
        self.handler.store().read_depth(out)
    }

    /// Like [`get_rgb`](Self::get_rgb), including timestamp and sequence.
    pub fn get_color_frame(&self, out: &mut ColorFrame) -> bool {
        self.handler.store().read_color(out)
    }

    /// Owned copy of the latest unread depth frame.
    pub fn latest_depth(&self) -> Option<DepthFrame> {
        self.handler.store().latest_depth()
    }

    /// Owned copy of the latest unread color frame.
    pub fn latest_color(&self) -> Option<ColorFrame> {
        self.handler.store().latest_color()
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the IR (depth) camera intrinsics.
    pub fn ir_camera_parameters(&self) -> IntrinsicParameters {
        self.config.ir_camera_parameters()
    }

    /// Returns the RGB camera intrinsics.
    pub fn rgb_camera_parameters(&self) -> IntrinsicParameters {
        self.config.rgb_camera_parameters()
    }

    /// Replaces the IR (depth) camera intrinsics.
    pub fn set_ir_camera_parameters(&mut self, cam: IntrinsicParameters) {
        self.config.set_ir_camera_parameters(cam);
    }

    /// Replaces the RGB camera intrinsics.
    pub fn set_rgb_camera_parameters(&mut self, cam: IntrinsicParameters) {
        self.config.set_rgb_camera_parameters(cam);
    }

    /// Returns counters for the session and both channels.
    pub fn stats(&self) -> AcquisitionStats {
        let (state, sessions) = {
            let session = self.session.lock();
            (session.state, session.sessions)
        };
        AcquisitionStats {
            state,
            sessions,
            capture: self.handler.stats(),
            store: self.handler.store().stats(),
        }
    }
}

impl<D: DeviceDriver> Drop for Acquisition<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{DepthFormat, DEPTH_RAW_NO_VALUE, VALID};
    use crate::device::{DeviceError, MockDevice, MockHandle, TiltStatus};
    use crate::frame::Rgba;
    use std::thread;
    use std::time::Duration;

    fn setup(width: u32, height: u32) -> (Acquisition<MockDevice>, MockHandle) {
        let config = DeviceConfig::with_dimensions(width, height);
        let device = MockDevice::new(&config);
        let handle = device.handle();
        (Acquisition::new(device, config).unwrap(), handle)
    }

    #[test]
    fn test_all_sentinel_depth_then_no_new_data() {
        let (acq, handle) = setup(4, 4);
        acq.start().unwrap();

        let raw = DepthFormat::Unpacked11Bit.encode(&[DEPTH_RAW_NO_VALUE; 16]);
        assert!(handle.emit_depth(&raw, 100));

        let mut distance = DistanceMap::new(4, 4);
        let mut validity = ValidityMap::new(4, 4);
        distance.pixels_mut().fill(9.0);
        validity.pixels_mut().fill(9);

        assert!(acq.get_depth_map(&mut distance, &mut validity));
        assert!(distance.pixels().iter().all(|&d| d == 0.0));
        assert!(validity.pixels().iter().all(|&v| v == 0));

        distance.pixels_mut().fill(1.0);
        assert!(!acq.get_depth_map(&mut distance, &mut validity));
        assert!(distance.pixels().iter().all(|&d| d == 1.0));
    }

    #[test]
    fn test_color_delivered_once() {
        let (acq, handle) = setup(2, 2);
        acq.start().unwrap();

        let raw: Vec<u8> = (0..12).collect();
        assert!(handle.emit_color(&raw, 5));

        let mut color = ColorImage::new(2, 2);
        assert!(acq.get_rgb(&mut color));
        let expected: Vec<Rgba> = raw
            .chunks_exact(3)
            .map(|px| Rgba::opaque(px[0], px[1], px[2]))
            .collect();
        assert_eq!(color.pixels(), expected.as_slice());

        assert!(!acq.get_rgb(&mut color));
    }

    #[test]
    fn test_depth_only_leaves_color_stale() {
        let (acq, handle) = setup(3, 2);
        acq.start().unwrap();

        let raw = DepthFormat::Unpacked11Bit.encode(&[700; 6]);
        handle.emit_depth(&raw, 1);

        let mut distance = DistanceMap::new(3, 2);
        let mut validity = ValidityMap::new(3, 2);
        let mut color = ColorImage::new(3, 2);
        assert!(acq.get_depth_map(&mut distance, &mut validity));
        assert!(validity.pixels().iter().all(|&v| v == VALID));
        assert!(!acq.get_rgb(&mut color));
    }

    #[test]
    fn test_start_stop_idempotent() {
        let (acq, handle) = setup(2, 2);
        assert_eq!(acq.state(), SessionState::Stopped);

        acq.stop();
        assert_eq!(acq.state(), SessionState::Stopped);

        acq.start().unwrap();
        acq.start().unwrap();
        assert!(acq.is_running());
        assert_eq!(acq.stats().sessions, 1);

        acq.stop();
        acq.stop();
        assert_eq!(acq.state(), SessionState::Stopped);
        assert!(!handle.is_capturing());
    }

    #[test]
    fn test_no_callbacks_after_stop() {
        let (acq, handle) = setup(2, 2);
        acq.start().unwrap();
        acq.stop();

        let raw = DepthFormat::Unpacked11Bit.encode(&[600; 4]);
        assert!(!handle.emit_depth(&raw, 1));
        assert!(acq.latest_depth().is_none());
    }

    #[test]
    fn test_failed_start_stays_stopped() {
        let config = DeviceConfig::with_dimensions(2, 2);
        let device = MockDevice::new(&config).with_start_failure();
        let acq = Acquisition::new(device, config).unwrap();

        assert!(matches!(
            acq.start(),
            Err(AcquisitionError::Device(DeviceError::StartFailed(_)))
        ));
        assert_eq!(acq.state(), SessionState::Stopped);
    }

    #[test]
    fn test_update_state_requires_running() {
        let (acq, _handle) = setup(2, 2);
        assert!(matches!(
            acq.update_state(),
            Err(AcquisitionError::NotRunning)
        ));

        acq.start().unwrap();
        acq.set_tilt_angle(-3.0);
        let state = acq.update_state().unwrap();
        assert_eq!(state.tilt_angle, -3.0);
        assert_eq!(state.tilt_status, TiltStatus::Stopped);

        acq.stop();
        assert!(acq.update_state().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DeviceConfig::with_dimensions(0, 0);
        let device = MockDevice::new(&config);
        assert!(matches!(
            Acquisition::new(device, config),
            Err(AcquisitionError::Config(_))
        ));
    }

    #[test]
    fn test_intrinsics_accessors() {
        let (mut acq, _handle) = setup(2, 2);
        let cam = IntrinsicParameters::without_distortion(500.0, 500.0, 1.0, 1.0);
        acq.set_rgb_camera_parameters(cam);
        assert_eq!(acq.rgb_camera_parameters(), cam);
        assert_eq!(acq.ir_camera_parameters(), IntrinsicParameters::kinect_ir());
    }

    #[test]
    fn test_frame_metadata_and_drop_counting() {
        let (acq, handle) = setup(2, 1);
        acq.start().unwrap();

        let raw = DepthFormat::Unpacked11Bit.encode(&[600, 650]);
        handle.emit_depth(&raw, 10);
        handle.emit_depth(&raw, 20);

        let mut frame = DepthFrame::blank(2, 1);
        assert!(acq.get_depth_frame(&mut frame));
        assert_eq!((frame.timestamp, frame.sequence), (20, 2));

        let stats = acq.stats();
        assert_eq!(stats.capture.depth_frames, 2);
        assert_eq!(stats.store.depth.overwritten, 1);
        assert_eq!(stats.store.depth.reads, 1);
    }

    #[test]
    fn test_free_running_device_with_polling_consumer() {
        let config = DeviceConfig::with_dimensions(16, 12);
        let device = MockDevice::new(&config)
            .with_frame_interval(Duration::from_millis(1))
            .with_no_return_ratio(0.25);
        let acq = Arc::new(Acquisition::new(device, config).unwrap());
        acq.start().unwrap();

        let consumer = {
            let acq = Arc::clone(&acq);
            thread::spawn(move || {
                let mut frame = DepthFrame::blank(16, 12);
                let mut color = ColorFrame::blank(16, 12);
                let mut last = (0, 0);
                let mut received = (0, 0);
                while received.0 < 5 || received.1 < 5 {
                    if acq.get_depth_frame(&mut frame) {
                        assert!(frame.sequence > last.0);
                        last.0 = frame.sequence;
                        received.0 += 1;
                        // Every pixel is either a measurement or the sentinel pair
                        let pairs = frame.distance.pixels().iter().zip(frame.validity.pixels());
                        for (&d, &v) in pairs {
                            assert!((v == VALID && d > 0.0) || (v == 0 && d == 0.0));
                        }
                    }
                    if acq.get_color_frame(&mut color) {
                        assert!(color.sequence > last.1);
                        last.1 = color.sequence;
                        received.1 += 1;
                    }
                    thread::yield_now();
                }
                received
            })
        };

        let received = consumer.join().unwrap();
        acq.stop();
        assert!(received.0 >= 5 && received.1 >= 5);

        let stats = acq.stats();
        assert_eq!(stats.capture.depth_rejected, 0);
        assert!(stats.store.depth.writes >= stats.store.depth.reads);
    }
}
