use crate::pump::{FramePump, PumpStats};
use crate::shutdown::{teardown, ShutdownToken, TeardownReport};
use crate::{HarnessConfig, Result};
use serde::{Serialize, Serializer};
use slam_bridge::TrackingEngine;
use std::fs;
use std::path::Path;
use stereo_camera::{CameraSession, StereoDevice};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, info_span};
use uuid::Uuid;

/// Outcome of one complete acquisition run.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    #[serde(serialize_with = "rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub finished_at: OffsetDateTime,
    pub pump: PumpStats,
    pub teardown: TeardownReport,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

fn rfc3339<S: Serializer>(t: &OffsetDateTime, s: S) -> core::result::Result<S::Ok, S::Error> {
    let text = t
        .format(&Rfc3339)
        .map_err(<S::Error as serde::ser::Error>::custom)?;
    s.serialize_str(&text)
}

/// Bring the camera up, construct the engine, pump frames until `token`
/// stops, then tear both down.
///
/// Startup faults are returned before any frame is pumped; whatever was
/// already acquired is released on the way out.
pub fn run_session<D, E>(
    device: D,
    config: &HarnessConfig,
    token: &ShutdownToken,
) -> Result<RunSummary>
where
    D: StereoDevice,
    E: TrackingEngine,
{
    config.validate()?;
    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id);
    let _guard = span.enter();
    let started_at = OffsetDateTime::now_utc();

    let mut camera = CameraSession::initialize(device, &config.session_config())?;
    let mut engine = E::construct(&config.engine_config())?;

    info!(
        resolution = %camera.resolution(),
        window = config.sampling_window,
        "streaming; interrupt to stop"
    );
    let pump = FramePump::new(config.sampling_window).run(&mut camera, &mut engine, token);
    let teardown = teardown(&mut engine, camera, &config.teardown_plan());

    Ok(RunSummary {
        run_id,
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        pump,
        teardown,
    })
}
