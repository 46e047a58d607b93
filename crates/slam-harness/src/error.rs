use slam_bridge::EngineError;
use stereo_camera::InitError;
use thiserror::Error;

pub type Result<T, E = HarnessError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("camera initialization failed: {0}")]
    Camera(#[from] InitError),
    #[error("tracking engine construction failed: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
