//! Depth map normalization and the external depth-estimation boundary.

use std::path::PathBuf;

use anyhow::Context as _;

use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::frame::FrameRgb;
use crate::foundation::grid::ScalarGrid;

/// Guard against constant depth grids before the epsilon can mask them.
const MIN_DEPTH_RANGE: f32 = 1e-6;

/// Epsilon in the normalization denominator.
const NORM_EPSILON: f32 = 1e-8;

/// Per-pixel relative depth aligned 1:1 with a source photo.
///
/// Every value lies in `[0, 1]`. Construction goes through [`normalize_depth`], which
/// rejects degenerate inputs, so consumers never see a flat or non-finite map.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthMap {
    grid: ScalarGrid,
}

impl DepthMap {
    /// Wrap a grid whose values are already normalized to `[0, 1]`.
    ///
    /// Escape hatch for estimators that emit unit-range output directly; rejects
    /// non-finite or out-of-range values. Unlike [`normalize_depth`], a constant grid
    /// is accepted here — the caller is asserting the range is intentional.
    pub fn from_unit_grid(grid: ScalarGrid) -> DriftResult<Self> {
        if grid.is_empty() {
            return Err(DriftError::depth("depth grid is empty"));
        }
        if grid.data().iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(DriftError::depth(
                "depth grid values must be finite and within [0, 1]",
            ));
        }
        Ok(Self { grid })
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn grid(&self) -> &ScalarGrid {
        &self.grid
    }

    /// Invert sense via `1 - v`, so that 1.0 means "most displaced" (closest to camera).
    pub fn inverted(&self) -> DepthMap {
        let mut grid = self.grid.clone();
        for v in grid.data_mut() {
            *v = 1.0 - *v;
        }
        DepthMap { grid }
    }
}

/// Rescale a raw depth grid to `[0, 1]` via `(v - min) / (max - min + eps)`.
///
/// The global minimum maps to 0 and the global maximum to ~1. No inversion is applied
/// here; call [`DepthMap::inverted`] where "closer moves more" semantics are needed.
///
/// Degenerate inputs abort instead of silently producing a motionless clip: an empty
/// grid, any non-finite value, or an all-equal grid is a [`DriftError::Depth`].
pub fn normalize_depth(raw: &ScalarGrid) -> DriftResult<DepthMap> {
    if raw.is_empty() {
        return Err(DriftError::depth("raw depth grid is empty"));
    }
    if !raw.is_finite() {
        return Err(DriftError::depth(
            "raw depth grid contains non-finite values",
        ));
    }

    let (lo, hi) = raw
        .min_max()
        .ok_or_else(|| DriftError::depth("raw depth grid is empty"))?;
    let range = hi - lo;
    if range < MIN_DEPTH_RANGE {
        return Err(DriftError::depth(format!(
            "raw depth grid is constant (range {range:e}); refusing to render a flat clip"
        )));
    }

    let inv = 1.0 / (range + NORM_EPSILON);
    let mut grid = raw.clone();
    for v in grid.data_mut() {
        *v = (*v - lo) * inv;
    }
    Ok(DepthMap { grid })
}

/// External depth-estimation capability.
///
/// Implementations produce a dense raw depth grid matching the photo's pixel grid.
/// Model choice, accelerators, and accuracy are entirely the implementor's concern.
pub trait DepthEstimator {
    fn estimate(&self, image: &FrameRgb) -> DriftResult<ScalarGrid>;
}

/// Depth "estimator" that reads a precomputed depth rendering from disk.
///
/// The file is decoded as grayscale (brighter = larger raw value) and, when its
/// dimensions differ from the photo, bilinearly resized to match — the same treatment
/// the upstream model prediction receives before normalization.
#[derive(Clone, Debug)]
pub struct GrayImageDepth {
    path: PathBuf,
}

impl GrayImageDepth {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_gray(&self) -> DriftResult<image::GrayImage> {
        let dyn_img = image::open(&self.path)
            .with_context(|| format!("decode depth image '{}'", self.path.display()))
            .map_err(|e| DriftError::input(format!("{e:#}")))?;
        Ok(dyn_img.to_luma8())
    }
}

impl DepthEstimator for GrayImageDepth {
    fn estimate(&self, image: &FrameRgb) -> DriftResult<ScalarGrid> {
        let mut gray = self.load_gray()?;
        if gray.dimensions() != (image.width, image.height) {
            gray = image::imageops::resize(
                &gray,
                image.width,
                image.height,
                image::imageops::FilterType::Triangle,
            );
        }

        let data = gray
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 255.0)
            .collect();
        ScalarGrid::from_raw(image.width, image.height, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_extremes_to_unit_range() {
        let raw = ScalarGrid::from_raw(2, 2, vec![10.0, 20.0, 15.0, 30.0]).unwrap();
        let depth = normalize_depth(&raw).unwrap();

        let d = depth.grid().data();
        assert!(d.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(d[0], 0.0);
        assert!((d[3] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_rejects_degenerate_grids() {
        assert!(matches!(
            normalize_depth(&ScalarGrid::new(0, 0)),
            Err(DriftError::Depth(_))
        ));
        assert!(matches!(
            normalize_depth(&ScalarGrid::splat(4, 4, 7.5)),
            Err(DriftError::Depth(_))
        ));
        let nan = ScalarGrid::from_raw(2, 1, vec![1.0, f32::NAN]).unwrap();
        assert!(matches!(normalize_depth(&nan), Err(DriftError::Depth(_))));
    }

    #[test]
    fn from_unit_grid_checks_range() {
        assert!(DepthMap::from_unit_grid(ScalarGrid::splat(2, 2, 0.5)).is_ok());
        assert!(DepthMap::from_unit_grid(ScalarGrid::new(0, 0)).is_err());
        assert!(DepthMap::from_unit_grid(ScalarGrid::splat(2, 2, 1.5)).is_err());
        let nan = ScalarGrid::from_raw(2, 1, vec![0.5, f32::NAN]).unwrap();
        assert!(DepthMap::from_unit_grid(nan).is_err());
    }

    #[test]
    fn inverted_flips_sense() {
        let raw = ScalarGrid::from_raw(2, 1, vec![0.0, 10.0]).unwrap();
        let depth = normalize_depth(&raw).unwrap().inverted();
        let d = depth.grid().data();
        assert!((d[0] - 1.0).abs() < 1e-6);
        assert!(d[1].abs() < 1e-5);
    }

    #[test]
    fn gray_image_depth_resizes_to_photo_grid() {
        let dir = std::env::temp_dir().join(format!("depthdrift_depth_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("depth.png");

        // 2x2 depth rendering against a 4x4 photo.
        image::save_buffer_with_format(
            &path,
            &[0u8, 64, 128, 255],
            2,
            2,
            image::ColorType::L8,
            image::ImageFormat::Png,
        )
        .unwrap();

        let photo = FrameRgb::from_raw(4, 4, vec![0u8; 4 * 4 * 3]).unwrap();
        let raw = GrayImageDepth::new(&path).estimate(&photo).unwrap();
        assert_eq!(raw.width(), 4);
        assert_eq!(raw.height(), 4);
        assert!(raw.data().iter().all(|v| (0.0..=1.0).contains(v)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
