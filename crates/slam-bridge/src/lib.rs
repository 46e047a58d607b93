//! slam-bridge: the boundary to an external visual SLAM engine
//!
//! Engines implement [`TrackingEngine`]; the harness only constructs them,
//! feeds stereo pairs, shuts them down and asks for the trajectory. The
//! default build enables a `mock` engine.

mod types;
pub use types::{EngineConfig, Pose, SensorMode};

mod error;
pub use error::{EngineError, Result};

mod traits;
pub use traits::TrackingEngine;

pub mod trajectory;
pub use trajectory::{StampedPose, Trajectory, TrajectoryFormat};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::MockEngine;
