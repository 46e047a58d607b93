use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = EngineError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("sensor mode not supported: {0}")]
    UnsupportedSensor(&'static str),
    #[error("left/right images differ in size: {left} vs {right}")]
    MismatchedImages { left: String, right: String },
    #[error("engine has been shut down")]
    ShutDown,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend error: {0}")]
    Backend(String),
}
