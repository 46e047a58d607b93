//! stereo-camera: stereo depth camera contract and session management
//!
//! The vendor SDK is reached through the [`StereoDevice`] trait. A
//! [`CameraSession`] negotiates and validates the capture configuration,
//! owns the frame buffers, and releases the device on every exit path. The
//! default build enables a `mock` device so binaries run without hardware.

mod types;
pub use types::{
    BitDepth, CaptureMode, FetchStatus, Image, Pixel, PixelFormat, Resolution, StreamState,
};

mod error;
pub use error::{Error, InitError, Result};

mod traits;
pub use traits::StereoDevice;

pub mod session;
pub use session::{CameraSession, CloseReport, FrameBuffers, SessionConfig};

#[cfg(feature = "mock")]
pub mod mock;
#[cfg(feature = "mock")]
pub use mock::MockStereoDevice;
