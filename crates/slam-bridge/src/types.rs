use core::fmt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Input configuration of the tracking engine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorMode {
    Monocular,
    #[default]
    Stereo,
    Rgbd,
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorMode::Monocular => "monocular",
            SensorMode::Stereo => "stereo",
            SensorMode::Rgbd => "rgbd",
        };
        f.write_str(s)
    }
}

/// Everything the engine needs at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Feature vocabulary file
    pub vocabulary: PathBuf,
    /// Engine settings file (camera intrinsics, feature parameters)
    pub settings: PathBuf,
    pub sensor: SensorMode,
    /// Open the live map/trajectory viewer
    pub viewer: bool,
}

/// Rigid camera pose `[R|t]`, camera-to-world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub const fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0; 3],
        }
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: [x, y, z],
            ..Self::identity()
        }
    }

    /// Rotation about the camera's vertical axis, then translation.
    pub fn from_yaw(yaw: f64, translation: [f64; 3]) -> Self {
        let (s, c) = yaw.sin_cos();
        Self {
            rotation: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
            translation,
        }
    }

    /// Row-major 3x4 matrix.
    pub fn matrix3x4(&self) -> [f64; 12] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[0][0], r[0][1], r[0][2], t[0], //
            r[1][0], r[1][1], r[1][2], t[1], //
            r[2][0], r[2][1], r[2][2], t[2],
        ]
    }

    /// Unit quaternion `[x, y, z, w]` of the rotation part.
    pub fn quaternion(&self) -> [f64; 4] {
        let m = &self.rotation;
        let trace = m[0][0] + m[1][1] + m[2][2];
        let (x, y, z, w) = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            (
                (m[2][1] - m[1][2]) / s,
                (m[0][2] - m[2][0]) / s,
                (m[1][0] - m[0][1]) / s,
                0.25 * s,
            )
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
            (
                0.25 * s,
                (m[0][1] + m[1][0]) / s,
                (m[0][2] + m[2][0]) / s,
                (m[2][1] - m[1][2]) / s,
            )
        } else if m[1][1] > m[2][2] {
            let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
            (
                (m[0][1] + m[1][0]) / s,
                0.25 * s,
                (m[1][2] + m[2][1]) / s,
                (m[0][2] - m[2][0]) / s,
            )
        } else {
            let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
            (
                (m[0][2] + m[2][0]) / s,
                (m[1][2] + m[2][1]) / s,
                0.25 * s,
                (m[1][0] - m[0][1]) / s,
            )
        };
        [x, y, z, w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identity_quaternion() {
        assert_eq!(Pose::identity().quaternion(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn yaw_quaternion_is_about_y() {
        let q = Pose::from_yaw(std::f64::consts::FRAC_PI_2, [0.0; 3]).quaternion();
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!(close(q[0], 0.0) && close(q[1], h) && close(q[2], 0.0) && close(q[3], h));
    }

    #[test]
    fn half_turn_takes_the_non_trace_branch() {
        let q = Pose::from_yaw(std::f64::consts::PI, [0.0; 3]).quaternion();
        assert!(close(q[1].abs(), 1.0));
        assert!(close(q[3], 0.0));
    }

    #[test]
    fn matrix_is_row_major() {
        let m = Pose::from_translation(1.0, 2.0, 3.0).matrix3x4();
        assert_eq!(m[3], 1.0);
        assert_eq!(m[7], 2.0);
        assert_eq!(m[11], 3.0);
        assert_eq!(m[0], 1.0);
        assert_eq!(m[5], 1.0);
    }
}
