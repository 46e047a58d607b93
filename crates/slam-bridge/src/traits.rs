use crate::{EngineConfig, Pose, Result, TrajectoryFormat};
use std::path::Path;
use stereo_camera::Image;

/// A visual SLAM system fed with rectified stereo pairs.
pub trait TrackingEngine {
    /// Load the vocabulary and settings and start the engine's own threads.
    fn construct(config: &EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Track one rectified stereo pair.
    ///
    /// Blocks until the engine has consumed or copied both images; callers
    /// may overwrite them as soon as this returns. Returns the estimated
    /// camera pose when tracking is established.
    fn track_stereo(
        &mut self,
        left: &Image<u8>,
        right: &Image<u8>,
        timestamp: f64,
    ) -> Result<Option<Pose>>;

    /// Stop all internal activity and flush state. Idempotent.
    fn shutdown(&mut self);

    /// Persist the accumulated trajectory.
    fn save_trajectory(&self, path: &Path, format: TrajectoryFormat) -> Result<()>;
}
