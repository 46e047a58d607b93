use crate::shutdown::TeardownPlan;
use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use slam_bridge::{EngineConfig, SensorMode, TrajectoryFormat};
use std::fs;
use std::path::{Path, PathBuf};
use stereo_camera::{CaptureMode, SessionConfig};

pub const DEFAULT_SAMPLING_WINDOW: u32 = 50;

/// Paths and knobs of one acquisition run.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub vocabulary: PathBuf,
    pub settings: PathBuf,
    pub trajectory_path: PathBuf,
    pub trajectory_format: TrajectoryFormat,
    /// Successful frames per throughput measurement
    pub sampling_window: u32,
    pub capture_mode: CaptureMode,
    pub viewer: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            vocabulary: PathBuf::from("Vocabulary/ORBvoc.bin"),
            settings: PathBuf::from("Examples/CS480/CS480.yaml"),
            trajectory_path: PathBuf::from("CameraTrajectory.txt"),
            trajectory_format: TrajectoryFormat::Kitti,
            sampling_window: DEFAULT_SAMPLING_WINDOW,
            capture_mode: CaptureMode::LeftRightDisparity,
            viewer: false,
        }
    }
}

impl HarnessConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s).map_err(|e| HarnessError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling_window == 0 {
            return Err(HarnessError::Config("sampling_window must be at least 1".into()));
        }
        if self.trajectory_path.as_os_str().is_empty() {
            return Err(HarnessError::Config("trajectory_path is empty".into()));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mode: self.capture_mode,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            vocabulary: self.vocabulary.clone(),
            settings: self.settings.clone(),
            sensor: SensorMode::Stereo,
            viewer: self.viewer,
        }
    }

    pub fn teardown_plan(&self) -> TeardownPlan {
        TeardownPlan {
            trajectory_path: self.trajectory_path.clone(),
            format: self.trajectory_format,
        }
    }
}
