use crate::shutdown::ShutdownToken;
use serde::Serialize;
use slam_bridge::TrackingEngine;
use std::time::Instant;
use stereo_camera::{CameraSession, FetchStatus, StereoDevice};
use tracing::{debug, info, warn};

/// Throughput over one sampling window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RateSample {
    pub frames: u32,
    pub elapsed_secs: f64,
    pub fps: f64,
}

/// Counts successful frames and reports fps once per window.
#[derive(Debug)]
pub struct RateMeter {
    window: u32,
    count: u32,
    boundary: Instant,
}

impl RateMeter {
    pub fn new(window: u32, start: Instant) -> Self {
        Self {
            window: window.max(1),
            count: 0,
            boundary: start,
        }
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    /// Frames counted since the last boundary.
    pub fn pending(&self) -> u32 {
        self.count
    }

    /// Count one successful frame captured at `now`.
    ///
    /// Returns a sample when the window fills; the boundary then moves to
    /// `now` and the count resets.
    pub fn record(&mut self, now: Instant) -> Option<RateSample> {
        self.count += 1;
        if self.count < self.window {
            return None;
        }
        let elapsed_secs = now.saturating_duration_since(self.boundary).as_secs_f64();
        let fps = if elapsed_secs > 0.0 {
            f64::from(self.count) / elapsed_secs
        } else {
            f64::INFINITY
        };
        let sample = RateSample {
            frames: self.count,
            elapsed_secs,
            fps,
        };
        self.count = 0;
        self.boundary = now;
        Some(sample)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PumpStats {
    pub iterations: u64,
    /// Tracking calls issued (one per successful acquisition)
    pub delivered: u64,
    /// Deliveries for which the engine returned a pose
    pub poses: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub engine_errors: u64,
    /// Completed sampling windows
    pub rate_windows: u64,
    /// Most recent window; earlier ones are only logged
    pub last_rate: Option<RateSample>,
}

/// Acquire-and-deliver loop over a single set of frame buffers.
pub struct FramePump {
    meter: RateMeter,
    started: Instant,
    stats: PumpStats,
}

impl FramePump {
    pub fn new(sampling_window: u32) -> Self {
        let now = Instant::now();
        Self {
            meter: RateMeter::new(sampling_window, now),
            started: now,
            stats: PumpStats::default(),
        }
    }

    pub fn stats(&self) -> &PumpStats {
        &self.stats
    }

    /// One iteration: fetch a stereo triple and, on success, hand the pair to
    /// the engine. Timeouts and failures drop the frame.
    pub fn step<D, E>(&mut self, camera: &mut CameraSession<D>, engine: &mut E) -> FetchStatus
    where
        D: StereoDevice,
        E: TrackingEngine,
    {
        let status = camera.acquire();
        self.stats.iterations += 1;

        match status {
            FetchStatus::Success => {
                if let Some(sample) = self.meter.record(Instant::now()) {
                    info!(
                        fps = %format!("{:.2}", sample.fps),
                        frames = sample.frames,
                        "frame rate"
                    );
                    self.stats.rate_windows += 1;
                    self.stats.last_rate = Some(sample);
                }
                self.deliver(camera, engine);
            }
            FetchStatus::Timeout => {
                self.stats.timeouts += 1;
                warn!("fetch frame: timeout");
            }
            FetchStatus::Failure => {
                self.stats.failures += 1;
                warn!("fetch frame: failed");
            }
        }
        status
    }

    fn deliver<D, E>(&mut self, camera: &CameraSession<D>, engine: &mut E)
    where
        D: StereoDevice,
        E: TrackingEngine,
    {
        let timestamp = self.started.elapsed().as_secs_f64();
        let buffers = camera.buffers();
        self.stats.delivered += 1;
        match engine.track_stereo(&buffers.left, &buffers.right, timestamp) {
            Ok(Some(pose)) => {
                self.stats.poses += 1;
                debug!(timestamp, t = ?pose.translation, "pose");
            }
            Ok(None) => debug!(timestamp, "tracking not established"),
            Err(e) => {
                self.stats.engine_errors += 1;
                warn!(error = %e, "tracking call failed");
            }
        }
    }

    /// Iterate until `token` reports a stop. The token is only checked
    /// between iterations, so the frame in flight is always finished.
    pub fn run<D, E>(
        mut self,
        camera: &mut CameraSession<D>,
        engine: &mut E,
        token: &ShutdownToken,
    ) -> PumpStats
    where
        D: StereoDevice,
        E: TrackingEngine,
    {
        while !token.is_stopping() {
            self.step(camera, engine);
        }
        info!(
            iterations = self.stats.iterations,
            delivered = self.stats.delivered,
            timeouts = self.stats.timeouts,
            failures = self.stats.failures,
            "frame pump stopped"
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_once_per_window() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(50, t0);
        for i in 1..50 {
            assert!(meter.record(t0 + Duration::from_millis(i * 20)).is_none());
        }
        let sample = meter.record(t0 + Duration::from_secs(1));
        assert_eq!(
            sample,
            Some(RateSample {
                frames: 50,
                elapsed_secs: 1.0,
                fps: 50.0
            })
        );
        assert_eq!(meter.pending(), 0);
    }

    #[test]
    fn second_window_measures_from_previous_boundary() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(50, t0);
        let mut samples = Vec::new();
        for window in 0..2u64 {
            let base = t0 + Duration::from_secs(2 * window);
            for i in 1..=50u64 {
                if let Some(s) = meter.record(base + Duration::from_millis(i * 40)) {
                    samples.push(s);
                }
            }
        }
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], samples[1]);
        assert_eq!(samples[0].fps, 25.0);
    }

    #[test]
    fn stats_keep_only_the_latest_window() {
        let config = crate::HarnessConfig::default();
        let device = stereo_camera::MockStereoDevice::new();
        let mut camera = CameraSession::initialize(device, &config.session_config()).unwrap();
        let mut engine = slam_bridge::MockEngine::construct(&config.engine_config()).unwrap();
        let mut pump = FramePump::new(5);
        for _ in 0..1_000 {
            pump.step(&mut camera, &mut engine);
        }
        let stats = pump.stats();
        assert_eq!(stats.delivered, 1_000);
        assert_eq!(stats.rate_windows, 200);
        assert_eq!(stats.last_rate.map(|s| s.frames), Some(5));
    }

    #[test]
    fn zero_window_is_treated_as_one() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(0, t0);
        assert_eq!(meter.window(), 1);
        assert!(meter.record(t0 + Duration::from_millis(100)).is_some());
    }
}
