use crate::{
    EngineConfig, EngineError, Pose, Result, SensorMode, TrackingEngine, Trajectory,
    TrajectoryFormat,
};
use std::path::Path;
use stereo_camera::Image;
use tracing::{debug, info, warn};

const STEP_M: f64 = 0.1;
const STEP_YAW: f64 = 0.01;

/// Stand-in engine that integrates a constant forward motion per frame.
///
/// The first frame initializes the map and yields no pose, like a real
/// stereo tracker does.
pub struct MockEngine {
    trajectory: Trajectory,
    frames: u64,
    running: bool,
}

impl MockEngine {
    pub fn frames_tracked(&self) -> u64 {
        self.frames
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl TrackingEngine for MockEngine {
    fn construct(config: &EngineConfig) -> Result<Self> {
        if config.sensor != SensorMode::Stereo {
            return Err(EngineError::UnsupportedSensor("mock engine is stereo only"));
        }
        if config.viewer {
            warn!("mock engine has no viewer; ignoring");
        }
        info!(
            vocabulary = %config.vocabulary.display(),
            settings = %config.settings.display(),
            sensor = %config.sensor,
            "mock engine ready"
        );
        Ok(Self {
            trajectory: Trajectory::new(),
            frames: 0,
            running: true,
        })
    }

    fn track_stereo(
        &mut self,
        left: &Image<u8>,
        right: &Image<u8>,
        timestamp: f64,
    ) -> Result<Option<Pose>> {
        if !self.running {
            return Err(EngineError::ShutDown);
        }
        if left.resolution() != right.resolution() {
            return Err(EngineError::MismatchedImages {
                left: left.resolution().to_string(),
                right: right.resolution().to_string(),
            });
        }
        let k = self.frames as f64;
        self.frames += 1;
        let pose = Pose::from_yaw(k * STEP_YAW, [0.0, 0.0, k * STEP_M]);
        self.trajectory.push(timestamp, pose);
        debug!(frame = self.frames, timestamp, "tracked");
        if self.frames == 1 {
            Ok(None)
        } else {
            Ok(Some(pose))
        }
    }

    fn shutdown(&mut self) {
        if self.running {
            self.running = false;
            info!(frames = self.frames, "mock engine stopped");
        }
    }

    fn save_trajectory(&self, path: &Path, format: TrajectoryFormat) -> Result<()> {
        self.trajectory.save(path, format)?;
        info!(
            path = %path.display(),
            poses = self.trajectory.len(),
            ?format,
            "trajectory saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stereo_camera::Resolution;

    fn config() -> EngineConfig {
        EngineConfig {
            vocabulary: PathBuf::from("Vocabulary/ORBvoc.bin"),
            settings: PathBuf::from("settings.yaml"),
            sensor: SensorMode::Stereo,
            viewer: false,
        }
    }

    #[test]
    fn rejects_non_stereo_sensor() {
        let mut cfg = config();
        cfg.sensor = SensorMode::Monocular;
        assert!(matches!(
            MockEngine::construct(&cfg),
            Err(EngineError::UnsupportedSensor(_))
        ));
    }

    #[test]
    fn first_frame_initializes_without_pose() -> anyhow::Result<()> {
        let mut engine = MockEngine::construct(&config())?;
        let img = Image::<u8>::new(Resolution::new(4, 4));
        assert_eq!(engine.track_stereo(&img, &img, 0.0)?, None);
        let pose = engine.track_stereo(&img, &img, 0.1)?;
        assert_eq!(pose.map(|p| p.translation[2]), Some(STEP_M));
        assert_eq!(engine.trajectory().len(), 2);
        Ok(())
    }

    #[test]
    fn mismatched_pair_is_rejected() -> anyhow::Result<()> {
        let mut engine = MockEngine::construct(&config())?;
        let l = Image::<u8>::new(Resolution::new(4, 4));
        let r = Image::<u8>::new(Resolution::new(4, 2));
        assert!(matches!(
            engine.track_stereo(&l, &r, 0.0),
            Err(EngineError::MismatchedImages { .. })
        ));
        assert_eq!(engine.frames_tracked(), 0);
        Ok(())
    }

    #[test]
    fn tracking_after_shutdown_fails_but_save_works() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut engine = MockEngine::construct(&config())?;
        let img = Image::<u8>::new(Resolution::new(2, 2));
        engine.track_stereo(&img, &img, 0.0)?;
        engine.shutdown();
        engine.shutdown();
        assert!(!engine.is_running());
        assert!(matches!(
            engine.track_stereo(&img, &img, 1.0),
            Err(EngineError::ShutDown)
        ));

        let path = dir.path().join("traj.txt");
        engine.save_trajectory(&path, TrajectoryFormat::Kitti)?;
        assert_eq!(std::fs::read_to_string(&path)?.lines().count(), 1);
        Ok(())
    }
}
