use crate::CaptureMode;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Error reported by a device driver call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("camera not found: {0}")]
    NotFound(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("driver status {0:#x}")]
    Status(i32),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Fatal faults raised while bringing a camera session up.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("no camera connected")]
    DeviceUnavailable,
    #[error("capture mode {mode} not supported: {source}")]
    UnsupportedMode {
        mode: CaptureMode,
        #[source]
        source: Error,
    },
    #[error("failed to open camera: {0}")]
    OpenFailed(#[source] Error),
    #[error("failed to start stream: {0}")]
    StreamFailed(#[source] Error),
    #[error("illegal bit depth {0} (should be 8 or 16)")]
    InvalidBitDepth(u32),
    #[error("device reported an empty resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },
}
