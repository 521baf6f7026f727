//! Per-frame displacement field: absolute sampling coordinates into the source photo.

use crate::depth::DepthMap;
use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::grid::ScalarGrid;

/// Two W×H planes giving, for each output pixel, the (generally non-integer) source
/// coordinate to sample from: `sample_x = x + depth*shift_x`, `sample_y = y + depth*shift_y`.
///
/// The planes are allocated once and overwritten per frame via [`rebuild`](Self::rebuild),
/// so the hot loop does no per-frame allocation.
#[derive(Clone, Debug)]
pub struct DisplacementField {
    sample_x: ScalarGrid,
    sample_y: ScalarGrid,
}

impl DisplacementField {
    /// Allocate field buffers for a W×H grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            sample_x: ScalarGrid::new(width, height),
            sample_y: ScalarGrid::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.sample_x.width()
    }

    pub fn height(&self) -> u32 {
        self.sample_x.height()
    }

    pub fn sample_x(&self) -> &ScalarGrid {
        &self.sample_x
    }

    pub fn sample_y(&self) -> &ScalarGrid {
        &self.sample_y
    }

    /// Recompute both planes for one frame's shift magnitudes.
    ///
    /// `depth_inverted` must already carry "closer moves more" sense (see
    /// [`DepthMap::inverted`]): a cell at 1.0 shifts by the full magnitude, a cell at
    /// 0.0 stays put.
    pub fn rebuild(
        &mut self,
        depth_inverted: &DepthMap,
        shift_x: f32,
        shift_y: f32,
    ) -> DriftResult<()> {
        let (w, h) = (self.width(), self.height());
        if depth_inverted.width() != w || depth_inverted.height() != h {
            return Err(DriftError::validation(format!(
                "depth map {}x{} does not match field {}x{}",
                depth_inverted.width(),
                depth_inverted.height(),
                w,
                h
            )));
        }

        let depth = depth_inverted.grid().data();
        let sx = self.sample_x.data_mut();
        let sy = self.sample_y.data_mut();
        let mut i = 0usize;
        for y in 0..h {
            let base_y = y as f32;
            for x in 0..w {
                let d = depth[i];
                sx[i] = x as f32 + d * shift_x;
                sy[i] = base_y + d * shift_y;
                i += 1;
            }
        }
        Ok(())
    }
}
