use crate::{Pose, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pose-sequence text formats understood by trajectory evaluation tools.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryFormat {
    /// 12 values of the row-major 3x4 `[R|t]` per line
    #[default]
    Kitti,
    /// `timestamp tx ty tz qx qy qz qw` per line
    Tum,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StampedPose {
    pub timestamp: f64,
    pub pose: Pose,
}

/// Ordered camera poses accumulated over a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    poses: Vec<StampedPose>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: f64, pose: Pose) {
        self.poses.push(StampedPose { timestamp, pose });
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn poses(&self) -> &[StampedPose] {
        &self.poses
    }

    pub fn write<W: Write>(&self, out: &mut W, format: TrajectoryFormat) -> Result<()> {
        for stamped in &self.poses {
            match format {
                TrajectoryFormat::Kitti => write_kitti_line(out, &stamped.pose)?,
                TrajectoryFormat::Tum => write_tum_line(out, stamped)?,
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path, format: TrajectoryFormat) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out, format)?;
        out.flush()?;
        Ok(())
    }
}

fn write_kitti_line<W: Write>(out: &mut W, pose: &Pose) -> Result<()> {
    let m = pose.matrix3x4();
    let line = m
        .iter()
        .map(|v| format!("{v:.9}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{line}")?;
    Ok(())
}

fn write_tum_line<W: Write>(out: &mut W, stamped: &StampedPose) -> Result<()> {
    let [tx, ty, tz] = stamped.pose.translation;
    let [qx, qy, qz, qw] = stamped.pose.quaternion();
    writeln!(
        out,
        "{:.6} {tx:.9} {ty:.9} {tz:.9} {qx:.9} {qy:.9} {qz:.9} {qw:.9}",
        stamped.timestamp
    )?;
    Ok(())
}
