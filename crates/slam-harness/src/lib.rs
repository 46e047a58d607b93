//! slam-harness: stereo acquisition loop for an external SLAM engine
//!
//! - [`CameraSession`](stereo_camera::CameraSession) negotiation happens first
//! - [`FramePump`] pulls one stereo triple per iteration and delivers it
//! - [`ShutdownToken`] turns Ctrl-C into an orderly exit, followed by
//!   [`teardown`]
//!
//! [`run_session`] wires the three together for a configured run.

mod error;
pub use error::{HarnessError, Result};

pub mod config;
pub use config::{HarnessConfig, DEFAULT_SAMPLING_WINDOW};

pub mod pump;
pub use pump::{FramePump, PumpStats, RateMeter, RateSample};

pub mod shutdown;
pub use shutdown::{
    install_interrupt_handler, teardown, RunState, ShutdownToken, StepOutcome, TeardownPlan,
    TeardownReport, TeardownStage,
};

mod run;
pub use run::{run_session, RunSummary};
