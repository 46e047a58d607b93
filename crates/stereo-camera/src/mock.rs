use crate::{CaptureMode, Error, FetchStatus, Resolution, Result, StereoDevice};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A device call as seen by [`MockStereoDevice`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceCall {
    Probe,
    SetMode(CaptureMode),
    Open,
    StartStream,
    EnableRectification(bool),
    Fetch,
    StopStream,
    Close,
}

/// Shared record of the calls made on a mock device.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl Journal {
    fn push(&self, call: DeviceCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, call: &DeviceCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn contains(&self, call: &DeviceCall) -> bool {
        self.count(call) > 0
    }
}

type FetchHook = Box<dyn FnMut(u64) + Send>;

/// In-process stand-in for a stereo depth camera.
///
/// Produces a moving gray ramp on the left image, the same ramp shifted by a
/// constant disparity on the right, and a flat disparity map. Fetch outcomes
/// can be scripted; once the script runs out every fetch succeeds.
pub struct MockStereoDevice {
    available: bool,
    accept_mode: bool,
    open_ok: bool,
    stream_ok: bool,
    rectify_ok: bool,
    resolution: Resolution,
    bit_depth: u32,
    payload_length: Option<usize>,
    script: VecDeque<FetchStatus>,
    frame_interval: Option<Duration>,
    fetches: u64,
    streaming: bool,
    journal: Journal,
    on_fetch: Option<FetchHook>,
}

const SHIFT: u32 = 8;

impl Default for MockStereoDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStereoDevice {
    pub fn new() -> Self {
        Self {
            available: true,
            accept_mode: true,
            open_ok: true,
            stream_ok: true,
            rectify_ok: true,
            resolution: Resolution::new(320, 240),
            bit_depth: 8,
            payload_length: None,
            script: VecDeque::new(),
            frame_interval: None,
            fetches: 0,
            streaming: false,
            journal: Journal::default(),
            on_fetch: None,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn reject_mode(mut self) -> Self {
        self.accept_mode = false;
        self
    }

    pub fn fail_open(mut self) -> Self {
        self.open_ok = false;
        self
    }

    pub fn fail_stream(mut self) -> Self {
        self.stream_ok = false;
        self
    }

    pub fn fail_rectification(mut self) -> Self {
        self.rectify_ok = false;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bit_depth(mut self, bits: u32) -> Self {
        self.bit_depth = bits;
        self
    }

    /// Override the reported payload length (defaults to the exact size).
    pub fn with_payload_length(mut self, len: usize) -> Self {
        self.payload_length = Some(len);
        self
    }

    /// Outcomes returned by the next fetches, in order.
    pub fn with_script(mut self, outcomes: impl IntoIterator<Item = FetchStatus>) -> Self {
        self.script.extend(outcomes);
        self
    }

    /// Block each fetch for `interval`, emulating the sensor frame rate.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Called inside every fetch with its 1-based index, before it returns.
    pub fn on_fetch(mut self, hook: impl FnMut(u64) + Send + 'static) -> Self {
        self.on_fetch = Some(Box::new(hook));
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn fetches(&self) -> u64 {
        self.fetches
    }

    fn fill(&self, left: &mut [u8], right: &mut [u8], disparity: &mut [u16]) {
        let width = self.resolution.width.max(1);
        let phase = self.fetches as u32;
        for (idx, px) in left.iter_mut().enumerate() {
            let (x, y) = (idx as u32 % width, idx as u32 / width);
            *px = ((x + y + phase) % 256) as u8;
        }
        for (idx, px) in right.iter_mut().enumerate() {
            let (x, y) = (idx as u32 % width, idx as u32 / width);
            *px = ((x + SHIFT + y + phase) % 256) as u8;
        }
        // 12.4 fixed point, as most depth cameras report it
        disparity.fill((SHIFT * 16) as u16);
    }
}

impl StereoDevice for MockStereoDevice {
    fn probe_availability(&mut self) -> bool {
        self.journal.push(DeviceCall::Probe);
        self.available
    }

    fn set_mode(&mut self, mode: CaptureMode) -> Result<()> {
        self.journal.push(DeviceCall::SetMode(mode));
        if self.accept_mode {
            Ok(())
        } else {
            Err(Error::Unsupported("mock rejects every capture mode"))
        }
    }

    fn open(&mut self) -> Result<()> {
        self.journal.push(DeviceCall::Open);
        if self.open_ok {
            Ok(())
        } else {
            Err(Error::NotFound("mock0".to_string()))
        }
    }

    fn start_stream(&mut self) -> Result<()> {
        self.journal.push(DeviceCall::StartStream);
        if !self.stream_ok {
            return Err(Error::Status(-3));
        }
        self.streaming = true;
        Ok(())
    }

    fn enable_rectification(&mut self, enabled: bool) -> Result<()> {
        self.journal.push(DeviceCall::EnableRectification(enabled));
        if self.rectify_ok {
            Ok(())
        } else {
            Err(Error::Backend("rectification tables missing".to_string()))
        }
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    fn expected_payload_length(&self) -> usize {
        self.payload_length.unwrap_or(self.resolution.pixel_count() * 4)
    }

    fn fetch_frame(
        &mut self,
        left: &mut [u8],
        right: &mut [u8],
        disparity: &mut [u16],
        _len: usize,
    ) -> FetchStatus {
        self.journal.push(DeviceCall::Fetch);
        self.fetches += 1;
        if let Some(interval) = self.frame_interval {
            thread::sleep(interval);
        }
        let status = if self.streaming {
            self.script.pop_front().unwrap_or(FetchStatus::Success)
        } else {
            FetchStatus::Failure
        };
        if status == FetchStatus::Success {
            self.fill(left, right, disparity);
        }
        let n = self.fetches;
        if let Some(hook) = self.on_fetch.as_mut() {
            hook(n);
        }
        status
    }

    fn stop_stream(&mut self) {
        self.journal.push(DeviceCall::StopStream);
        self.streaming = false;
    }

    fn close(&mut self) {
        self.journal.push(DeviceCall::Close);
        self.streaming = false;
    }
}
