//! Camera session negotiation and scoped device ownership.
//!
//! [`CameraSession::initialize`] walks the device through availability, mode
//! selection, open, stream start and rectification, validates what the device
//! negotiated, and allocates the frame buffers exactly once. The returned
//! session owns the device until it is closed, explicitly or on drop.

use crate::{
    BitDepth, CaptureMode, FetchStatus, Image, InitError, Resolution, StereoDevice, StreamState,
};
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: CaptureMode,
}

/// Left/right grayscale and disparity storage reused by every fetch.
#[derive(Debug)]
pub struct FrameBuffers {
    pub left: Image<u8>,
    pub right: Image<u8>,
    pub disparity: Image<u16>,
}

impl FrameBuffers {
    fn allocate(resolution: Resolution) -> Self {
        Self {
            left: Image::new(resolution),
            right: Image::new(resolution),
            disparity: Image::new(resolution),
        }
    }

    /// Total bytes the three buffers can receive.
    pub fn capacity_bytes(&self) -> usize {
        self.left.byte_len() + self.right.byte_len() + self.disparity.byte_len()
    }
}

/// What happened while releasing the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloseReport {
    pub stream_stopped: bool,
    pub device_closed: bool,
}

/// A validated, streaming camera together with its frame buffers.
pub struct CameraSession<D: StereoDevice> {
    device: D,
    mode: CaptureMode,
    resolution: Resolution,
    bit_depth: BitDepth,
    stream: StreamState,
    open: bool,
    buffers: FrameBuffers,
}

impl<D: StereoDevice> CameraSession<D> {
    pub fn initialize(mut device: D, config: &SessionConfig) -> Result<Self, InitError> {
        if !device.probe_availability() {
            error!("no camera connected");
            return Err(InitError::DeviceUnavailable);
        }
        info!("camera connected");

        let mode = config.mode;
        if let Err(source) = device.set_mode(mode) {
            error!(%mode, error = %source, "capture mode not supported");
            return Err(InitError::UnsupportedMode { mode, source });
        }
        info!(%mode, "capture mode set");

        if let Err(e) = device.open() {
            error!(error = %e, "open camera failed");
            device.close();
            return Err(InitError::OpenFailed(e));
        }
        info!("camera opened");

        if let Err(e) = device
            .start_stream()
            .and_then(|()| device.enable_rectification(true))
        {
            error!(error = %e, "failed to start rectified stream");
            abort(&mut device);
            return Err(InitError::StreamFailed(e));
        }

        let resolution = device.resolution();
        let bits = device.bit_depth();
        let bit_depth = match BitDepth::try_from(bits) {
            Ok(depth) => depth,
            Err(bits) => {
                error!(bits, "bit depth illegal (should be 8 or 16)");
                abort(&mut device);
                return Err(InitError::InvalidBitDepth(bits));
            }
        };
        if resolution.is_empty() {
            error!(%resolution, "device reported an empty resolution");
            abort(&mut device);
            return Err(InitError::InvalidResolution {
                width: resolution.width,
                height: resolution.height,
            });
        }

        let buffers = FrameBuffers::allocate(resolution);
        info!(
            %resolution,
            bits = bit_depth.bits(),
            buffer_bytes = buffers.capacity_bytes(),
            "camera streaming"
        );

        Ok(Self {
            device,
            mode,
            resolution,
            bit_depth,
            stream: StreamState::Running,
            open: true,
            buffers,
        })
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Pull one synchronized left/right/disparity triple into the buffers.
    ///
    /// Anything other than [`FetchStatus::Success`] leaves the buffers in an
    /// unspecified state; callers must not forward them.
    pub fn acquire(&mut self) -> FetchStatus {
        if self.stream != StreamState::Running {
            return FetchStatus::Failure;
        }
        let len = self.device.expected_payload_length();
        if len > self.buffers.capacity_bytes() {
            warn!(
                len,
                capacity = self.buffers.capacity_bytes(),
                "payload larger than frame buffers"
            );
            return FetchStatus::Failure;
        }
        let FrameBuffers {
            left,
            right,
            disparity,
        } = &mut self.buffers;
        self.device.fetch_frame(
            left.pixels_mut(),
            right.pixels_mut(),
            disparity.pixels_mut(),
            len,
        )
    }

    /// Stop the data stream. Returns false if it was not running.
    pub fn stop_stream(&mut self) -> bool {
        if self.stream != StreamState::Running {
            return false;
        }
        self.device.stop_stream();
        self.stream = StreamState::Stopped;
        debug!("camera stream stopped");
        true
    }

    /// Close the device connection. Returns false if it was already closed.
    pub fn close_device(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.device.close();
        self.open = false;
        debug!("camera closed");
        true
    }

    /// Stop, close and release the device.
    pub fn close(mut self) -> CloseReport {
        let report = CloseReport {
            stream_stopped: self.stop_stream(),
            device_closed: self.close_device(),
        };
        self.release();
        report
    }

    /// Drop the device handle, stopping and closing it first if still live.
    pub fn release(self) {
        drop(self);
        debug!("camera handle released");
    }
}

impl<D: StereoDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.stop_stream();
        self.close_device();
    }
}

fn abort<D: StereoDevice>(device: &mut D) {
    device.stop_stream();
    device.close();
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::{DeviceCall, MockStereoDevice};

    #[test]
    fn unavailable_device_touches_nothing() {
        let device = MockStereoDevice::new().unavailable();
        let journal = device.journal();

        let err = CameraSession::initialize(device, &SessionConfig::default())
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("no camera connected"));
        assert_eq!(journal.calls(), vec![DeviceCall::Probe]);
    }

    #[test]
    fn rejected_mode_does_not_open() {
        let device = MockStereoDevice::new().reject_mode();
        let journal = device.journal();

        let result = CameraSession::initialize(device, &SessionConfig::default());
        assert!(matches!(result, Err(InitError::UnsupportedMode { .. })));
        assert!(!journal.contains(&DeviceCall::Open));
        assert!(!journal.contains(&DeviceCall::StartStream));
    }

    #[test]
    fn open_failure_closes_device() {
        let device = MockStereoDevice::new().fail_open();
        let journal = device.journal();

        let result = CameraSession::initialize(device, &SessionConfig::default());
        assert!(matches!(result, Err(InitError::OpenFailed(_))));
        assert_eq!(journal.count(&DeviceCall::Close), 1);
        assert!(!journal.contains(&DeviceCall::StartStream));
    }

    #[test]
    fn stream_start_failure_stops_and_closes() {
        let device = MockStereoDevice::new().fail_stream();
        let journal = device.journal();

        let result = CameraSession::initialize(device, &SessionConfig::default());
        assert!(matches!(result, Err(InitError::StreamFailed(_))));
        assert!(!journal.contains(&DeviceCall::EnableRectification(true)));
        assert_eq!(journal.count(&DeviceCall::StopStream), 1);
        assert_eq!(journal.count(&DeviceCall::Close), 1);
        assert!(!journal.contains(&DeviceCall::Fetch));
    }

    #[test]
    fn rectification_failure_stops_and_closes() {
        let device = MockStereoDevice::new().fail_rectification();
        let journal = device.journal();

        let result = CameraSession::initialize(device, &SessionConfig::default());
        assert!(matches!(result, Err(InitError::StreamFailed(crate::Error::Backend(_)))));
        let calls = journal.calls();
        assert_eq!(
            &calls[calls.len() - 3..],
            &[
                DeviceCall::EnableRectification(true),
                DeviceCall::StopStream,
                DeviceCall::Close
            ]
        );
        assert!(!journal.contains(&DeviceCall::Fetch));
    }

    #[test]
    fn bit_depth_twelve_stops_and_closes() {
        let device = MockStereoDevice::new().with_bit_depth(12);
        let journal = device.journal();

        let result = CameraSession::initialize(device, &SessionConfig::default());
        assert!(matches!(result, Err(InitError::InvalidBitDepth(12))));

        let calls = journal.calls();
        let stop = calls.iter().position(|c| *c == DeviceCall::StopStream);
        let close = calls.iter().position(|c| *c == DeviceCall::Close);
        assert!(stop.is_some() && close.is_some());
        assert!(stop < close);
        assert_eq!(journal.count(&DeviceCall::Close), 1);
        assert!(!journal.contains(&DeviceCall::Fetch));
    }

    #[test]
    fn any_other_bit_depth_is_rejected() {
        for bits in [0, 1, 7, 9, 10, 12, 15, 24, 32] {
            let device = MockStereoDevice::new().with_bit_depth(bits);
            let journal = device.journal();
            let result = CameraSession::initialize(device, &SessionConfig::default());
            assert!(matches!(result, Err(InitError::InvalidBitDepth(b)) if b == bits));
            assert_eq!(journal.count(&DeviceCall::Close), 1, "bits={bits}");
        }
    }

    #[test]
    fn empty_resolution_is_rejected() {
        let device = MockStereoDevice::new().with_resolution(Resolution::new(0, 480));
        let journal = device.journal();
        let result = CameraSession::initialize(device, &SessionConfig::default());
        assert!(matches!(
            result,
            Err(InitError::InvalidResolution {
                width: 0,
                height: 480
            })
        ));
        assert_eq!(journal.count(&DeviceCall::Close), 1);
    }

    #[test]
    fn successful_init_allocates_buffers_and_rectifies() -> anyhow::Result<()> {
        let device = MockStereoDevice::new()
            .with_resolution(Resolution::new(64, 48))
            .with_bit_depth(16);
        let journal = device.journal();

        let session = CameraSession::initialize(device, &SessionConfig::default())?;
        assert_eq!(session.resolution(), Resolution::new(64, 48));
        assert_eq!(session.bit_depth(), BitDepth::Sixteen);
        assert_eq!(session.stream_state(), StreamState::Running);

        let buffers = session.buffers();
        assert_eq!(buffers.left.resolution(), Resolution::new(64, 48));
        assert_eq!(buffers.right.pixel_format(), crate::PixelFormat::Gray8);
        assert_eq!(buffers.disparity.pixel_format(), crate::PixelFormat::Gray16);
        assert_eq!(buffers.capacity_bytes(), 64 * 48 * 4);

        assert_eq!(
            journal.calls(),
            vec![
                DeviceCall::Probe,
                DeviceCall::SetMode(CaptureMode::LeftRightDisparity),
                DeviceCall::Open,
                DeviceCall::StartStream,
                DeviceCall::EnableRectification(true),
            ]
        );
        Ok(())
    }

    #[test]
    fn close_stops_before_closing_once() -> anyhow::Result<()> {
        let device = MockStereoDevice::new();
        let journal = device.journal();
        let session = CameraSession::initialize(device, &SessionConfig::default())?;

        let report = session.close();
        assert!(report.stream_stopped && report.device_closed);
        let calls = journal.calls();
        let n = calls.len();
        assert_eq!(&calls[n - 2..], &[DeviceCall::StopStream, DeviceCall::Close]);
        assert_eq!(journal.count(&DeviceCall::Close), 1);
        Ok(())
    }

    #[test]
    fn drop_releases_device() -> anyhow::Result<()> {
        let device = MockStereoDevice::new();
        let journal = device.journal();
        {
            let _session = CameraSession::initialize(device, &SessionConfig::default())?;
        }
        assert_eq!(journal.count(&DeviceCall::StopStream), 1);
        assert_eq!(journal.count(&DeviceCall::Close), 1);
        Ok(())
    }

    #[test]
    fn oversized_payload_is_a_failure() -> anyhow::Result<()> {
        let device = MockStereoDevice::new()
            .with_resolution(Resolution::new(8, 8))
            .with_payload_length(8 * 8 * 4 + 1);
        let journal = device.journal();
        let mut session = CameraSession::initialize(device, &SessionConfig::default())?;
        assert_eq!(session.acquire(), FetchStatus::Failure);
        assert!(!journal.contains(&DeviceCall::Fetch));
        Ok(())
    }

    #[test]
    fn acquire_after_stop_is_a_failure() -> anyhow::Result<()> {
        let mut session =
            CameraSession::initialize(MockStereoDevice::new(), &SessionConfig::default())?;
        assert_eq!(session.acquire(), FetchStatus::Success);
        assert!(session.stop_stream());
        assert!(!session.stop_stream());
        assert_eq!(session.acquire(), FetchStatus::Failure);
        Ok(())
    }
}
