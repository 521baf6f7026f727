//! Eased camera-motion curve and per-run motion parameters.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Fps;
use crate::foundation::error::{DriftError, DriftResult};

/// Vertical shift magnitude relative to horizontal.
///
/// Tunable; the vertical component also runs in the opposite temporal direction, which
/// turns the pure horizontal sweep into a diagonal one.
pub const VERTICAL_SHIFT_RATIO: f64 = 0.6;

/// Immutable per-run motion configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MotionParams {
    /// Clip duration in seconds.
    pub duration_secs: f64,
    /// Output frame rate.
    pub fps: Fps,
    /// Maximum horizontal shift magnitude in pixels.
    pub max_shift_px: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            fps: Fps { num: 25, den: 1 },
            max_shift_px: 12.0,
        }
    }
}

impl MotionParams {
    pub fn validate(&self) -> DriftResult<()> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(DriftError::validation(
                "motion duration_secs must be finite and > 0",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(DriftError::validation("motion fps must be non-zero"));
        }
        if !self.max_shift_px.is_finite() || self.max_shift_px < 0.0 {
            return Err(DriftError::validation(
                "motion max_shift_px must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Total frame count: `round(duration * fps)`, minimum 1.
    pub fn total_frames(&self) -> u64 {
        let frames = (self.duration_secs * self.fps.as_f64()).round();
        (frames.max(1.0)) as u64
    }

    /// Load parameters from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> DriftResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read motion params '{}'", path.display()))?;
        let params: MotionParams = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse motion params '{}'", path.display()))?;
        params.validate()?;
        Ok(params)
    }
}

/// Eased shift magnitudes for one frame of the sweep.
///
/// Progress runs `t = frame / max(total_frames - 1, 1)` through the ease-in-out curve
/// `0.5 - 0.5*cos(PI*t)` (zero velocity at both endpoints). The horizontal shift sweeps
/// `[-max_shift_px, +max_shift_px]`; the vertical shift is [`VERTICAL_SHIFT_RATIO`]
/// times as large and runs in the opposite direction.
///
/// Frame 0 and the final frame do not share velocity, so a restarted loop has a visible
/// kink; callers wanting a seamless loop must handle that externally.
pub fn shifts_for_frame(frame: u64, total_frames: u64, max_shift_px: f64) -> (f64, f64) {
    let denom = total_frames.saturating_sub(1).max(1);
    let t = ((frame as f64) / (denom as f64)).clamp(0.0, 1.0);
    let ease = 0.5 - 0.5 * (std::f64::consts::PI * t).cos();

    let shift_x = (ease - 0.5) * 2.0 * max_shift_px;
    let shift_y = (0.5 - ease) * 2.0 * (max_shift_px * VERTICAL_SHIFT_RATIO);
    (shift_x, shift_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hit_configured_extremes_exactly() {
        let (x0, y0) = shifts_for_frame(0, 10, 12.0);
        assert_eq!(x0, -12.0);
        assert_eq!(y0, 12.0 * VERTICAL_SHIFT_RATIO);

        let (x1, y1) = shifts_for_frame(9, 10, 12.0);
        assert_eq!(x1, 12.0);
        assert_eq!(y1, -12.0 * VERTICAL_SHIFT_RATIO);
    }

    #[test]
    fn curve_is_point_symmetric_about_midpoint() {
        let n = 25u64;
        for i in 0..n {
            let (xa, ya) = shifts_for_frame(i, n, 8.0);
            let (xb, yb) = shifts_for_frame(n - 1 - i, n, 8.0);
            assert!((xa + xb).abs() < 1e-9, "x not symmetric at {i}");
            assert!((ya + yb).abs() < 1e-9, "y not symmetric at {i}");
        }
    }

    #[test]
    fn single_frame_clip_sits_at_sweep_start() {
        let (x, y) = shifts_for_frame(0, 1, 12.0);
        assert_eq!(x, -12.0);
        assert_eq!(y, 12.0 * VERTICAL_SHIFT_RATIO);
    }

    #[test]
    fn vertical_runs_opposite_at_reduced_magnitude() {
        for i in 0..50u64 {
            let (x, y) = shifts_for_frame(i, 50, 10.0);
            if x.abs() > 1e-12 {
                assert!(x.signum() == -y.signum());
                assert!((y.abs() / x.abs() - VERTICAL_SHIFT_RATIO).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn total_frames_rounds_with_minimum_one() {
        let p = MotionParams::default();
        assert_eq!(p.total_frames(), 125);

        let tiny = MotionParams {
            duration_secs: 0.001,
            ..MotionParams::default()
        };
        assert_eq!(tiny.total_frames(), 1);

        let ntsc = MotionParams {
            duration_secs: 2.0,
            fps: Fps {
                num: 30000,
                den: 1001,
            },
            ..MotionParams::default()
        };
        assert_eq!(ntsc.total_frames(), 60);
    }

    #[test]
    fn validate_rejects_bad_params() {
        let bad = MotionParams {
            duration_secs: 0.0,
            ..MotionParams::default()
        };
        assert!(bad.validate().is_err());

        let bad = MotionParams {
            max_shift_px: f64::NAN,
            ..MotionParams::default()
        };
        assert!(bad.validate().is_err());

        assert!(MotionParams::default().validate().is_ok());
    }

    #[test]
    fn params_parse_from_json() {
        let dir = std::env::temp_dir().join(format!("depthdrift_motion_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("motion.json");
        std::fs::write(
            &path,
            r#"{"duration_secs": 2.0, "fps": {"num": 30, "den": 1}, "max_shift_px": 6.0}"#,
        )
        .unwrap();

        let p = MotionParams::from_json_path(&path).unwrap();
        assert_eq!(p.duration_secs, 2.0);
        assert_eq!(p.fps, Fps { num: 30, den: 1 });
        assert_eq!(p.max_shift_px, 6.0);
        assert_eq!(p.total_frames(), 60);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
