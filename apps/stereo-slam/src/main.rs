//! stereo-slam: feed a stereo depth camera into a visual SLAM engine
//!
//! Runs until Ctrl-C, then shuts the engine down, writes the trajectory and
//! closes the camera.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use slam_bridge::TrajectoryFormat;
use slam_harness::{HarnessConfig, ShutdownToken};
use stereo_camera::CaptureMode;

#[derive(Parser, Debug)]
#[command(
    name = "stereo-slam",
    version,
    about = "Stream a stereo depth camera into a visual SLAM engine"
)]
struct Cli {
    /// Open the engine's live viewer
    #[arg(long, action = ArgAction::SetTrue)]
    viewer: bool,
    /// Harness config YAML; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Feature vocabulary file
    #[arg(long)]
    vocabulary: Option<PathBuf>,
    /// Engine settings file
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Trajectory output path
    #[arg(long)]
    trajectory: Option<PathBuf>,
    /// Trajectory file format
    #[arg(long, value_enum)]
    format: Option<Format>,
    /// Successful frames per fps measurement
    #[arg(long)]
    window: Option<u32>,
    /// Camera capture mode
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Write a JSON run summary here on exit
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Frame rate of the mock camera
    #[arg(long, default_value_t = 30u32)]
    mock_fps: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Kitti,
    Tum,
}

impl Format {
    fn into_trajectory(self) -> TrajectoryFormat {
        match self {
            Format::Kitti => TrajectoryFormat::Kitti,
            Format::Tum => TrajectoryFormat::Tum,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Mode {
    Lr,
    Ld,
    Lrd,
    LrHd,
}

impl Mode {
    fn into_capture(self) -> CaptureMode {
        match self {
            Mode::Lr => CaptureMode::LeftRight,
            Mode::Ld => CaptureMode::LeftDisparity,
            Mode::Lrd => CaptureMode::LeftRightDisparity,
            Mode::LrHd => CaptureMode::LeftRightHd,
        }
    }
}

fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing() {
    // Best-effort; default to info so the fps line is visible
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    if cli.viewer {
        config.viewer = true;
    }
    if let Some(p) = &cli.vocabulary {
        config.vocabulary = p.clone();
    }
    if let Some(p) = &cli.settings {
        config.settings = p.clone();
    }
    if let Some(p) = &cli.trajectory {
        config.trajectory_path = p.clone();
    }
    if let Some(f) = cli.format {
        config.trajectory_format = f.into_trajectory();
    }
    if let Some(w) = cli.window {
        config.sampling_window = w;
    }
    if let Some(m) = cli.mode {
        config.capture_mode = m.into_capture();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let token = ShutdownToken::new();
    slam_harness::install_interrupt_handler(&token)?;

    let summary = run_backend(&cli, &config, &token)?;

    info!(
        delivered = summary.pump.delivered,
        timeouts = summary.pump.timeouts,
        failures = summary.pump.failures,
        "run finished"
    );
    if !summary.teardown.is_clean() {
        warn!("teardown reported failures; see log above");
    }
    if let Some(path) = &cli.summary {
        summary
            .write_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

#[cfg(feature = "mock")]
fn run_backend(
    cli: &Cli,
    config: &HarnessConfig,
    token: &ShutdownToken,
) -> Result<slam_harness::RunSummary> {
    use std::time::Duration;

    let mut device = stereo_camera::MockStereoDevice::new();
    if cli.mock_fps > 0 {
        device = device.with_frame_interval(Duration::from_secs_f64(1.0 / f64::from(cli.mock_fps)));
    }
    let summary =
        slam_harness::run_session::<_, slam_bridge::MockEngine>(device, config, token)?;
    Ok(summary)
}

#[cfg(not(feature = "mock"))]
fn run_backend(
    _cli: &Cli,
    _config: &HarnessConfig,
    _token: &ShutdownToken,
) -> Result<slam_harness::RunSummary> {
    Err(anyhow::anyhow!("no camera backend compiled in (enable the `mock` feature)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "stereo-slam",
            "--viewer",
            "--trajectory",
            "out.txt",
            "--format",
            "tum",
            "--window",
            "10",
            "--mode",
            "lr",
        ]);
        let config = load_config(&cli).unwrap();
        assert!(config.viewer);
        assert_eq!(config.trajectory_path, PathBuf::from("out.txt"));
        assert_eq!(config.trajectory_format, TrajectoryFormat::Tum);
        assert_eq!(config.sampling_window, 10);
        assert_eq!(config.capture_mode, CaptureMode::LeftRight);
    }

    #[test]
    fn no_flags_is_the_reference_setup() {
        let cli = Cli::parse_from(["stereo-slam"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn zero_window_is_refused() {
        let cli = Cli::parse_from(["stereo-slam", "--window", "0"]);
        assert!(load_config(&cli).is_err());
    }
}
