//! Interrupt-driven stop and the fixed teardown sequence.
//!
//! The interrupt handler only flips a [`ShutdownToken`]. The pump notices at
//! its next iteration boundary, after which [`teardown`] runs, in order:
//! engine shutdown, trajectory export, stream stop, device close, handle
//! release. Every step runs even if an earlier one failed.

use crate::Result;
use serde::Serialize;
use slam_bridge::{TrackingEngine, TrajectoryFormat};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stereo_camera::{CameraSession, StereoDevice};
use tracing::{error, info};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunState {
    Running,
    Stopping,
}

/// One-way Running -> Stopping flag shared with the interrupt handler.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    stop: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Returns true only for the call that made the transition.
    pub fn trigger(&self) -> bool {
        !self.stop.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> RunState {
        if self.is_stopping() {
            RunState::Stopping
        } else {
            RunState::Running
        }
    }
}

/// Route Ctrl-C (SIGINT) to `token`. Can be installed once per process.
pub fn install_interrupt_handler(token: &ShutdownToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        token.trigger();
    })?;
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeardownPlan {
    pub trajectory_path: PathBuf,
    pub format: TrajectoryFormat,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownStage {
    EngineShutdown,
    SaveTrajectory,
    StopStream,
    CloseDevice,
    ReleaseDevice,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    /// Nothing to do, e.g. the stream was already stopped
    Skipped,
    Failed(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TeardownStep {
    pub stage: TeardownStage,
    pub outcome: StepOutcome,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TeardownReport {
    pub steps: Vec<TeardownStep>,
}

impl TeardownReport {
    fn record(&mut self, stage: TeardownStage, outcome: StepOutcome) {
        self.steps.push(TeardownStep { stage, outcome });
    }

    pub fn stages(&self) -> Vec<TeardownStage> {
        self.steps.iter().map(|s| s.stage).collect()
    }

    pub fn is_clean(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|s| matches!(s.outcome, StepOutcome::Failed(_)))
    }
}

/// Shut both collaborators down in the fixed order.
pub fn teardown<D, E>(
    engine: &mut E,
    camera: CameraSession<D>,
    plan: &TeardownPlan,
) -> TeardownReport
where
    D: StereoDevice,
    E: TrackingEngine,
{
    let mut report = TeardownReport::default();

    engine.shutdown();
    report.record(TeardownStage::EngineShutdown, StepOutcome::Done);

    let saved = match engine.save_trajectory(&plan.trajectory_path, plan.format) {
        Ok(()) => {
            info!(path = %plan.trajectory_path.display(), "trajectory written");
            StepOutcome::Done
        }
        Err(e) => {
            error!(path = %plan.trajectory_path.display(), error = %e, "saving trajectory failed");
            StepOutcome::Failed(e.to_string())
        }
    };
    report.record(TeardownStage::SaveTrajectory, saved);

    let closed = camera.close();
    report.record(TeardownStage::StopStream, done_or_skipped(closed.stream_stopped));
    report.record(TeardownStage::CloseDevice, done_or_skipped(closed.device_closed));
    report.record(TeardownStage::ReleaseDevice, StepOutcome::Done);

    info!(clean = report.is_clean(), "teardown complete");
    report
}

fn done_or_skipped(acted: bool) -> StepOutcome {
    if acted {
        StepOutcome::Done
    } else {
        StepOutcome::Skipped
    }
}
