use crate::{CaptureMode, FetchStatus, Resolution, Result};

/// A stereo depth camera as exposed by its vendor SDK.
///
/// Calls are blocking. Implementations are driven from a single thread and
/// never see concurrent calls.
pub trait StereoDevice {
    /// Whether a device is physically connected.
    fn probe_availability(&mut self) -> bool;

    /// Request a capture mode. Must be called before [`StereoDevice::open`].
    fn set_mode(&mut self, mode: CaptureMode) -> Result<()>;

    fn open(&mut self) -> Result<()>;

    fn start_stream(&mut self) -> Result<()>;

    fn enable_rectification(&mut self, enabled: bool) -> Result<()>;

    /// Negotiated resolution, valid once the stream is running.
    fn resolution(&self) -> Resolution;

    /// Negotiated bits per sample, valid once the stream is running.
    fn bit_depth(&self) -> u32;

    /// Bytes of one synchronized left/right/disparity payload.
    fn expected_payload_length(&self) -> usize;

    /// Fill the three buffers with the next synchronized frame.
    ///
    /// On anything but [`FetchStatus::Success`] the buffer contents are
    /// unspecified.
    fn fetch_frame(
        &mut self,
        left: &mut [u8],
        right: &mut [u8],
        disparity: &mut [u16],
        len: usize,
    ) -> FetchStatus;

    fn stop_stream(&mut self);

    fn close(&mut self);
}
