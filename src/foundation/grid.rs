use crate::foundation::error::{DriftError, DriftResult};

/// Dense row-major W×H grid of `f32` scalars.
///
/// Used both for raw/normalized depth values and for the per-frame displacement planes.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarGrid {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl ScalarGrid {
    /// Create a zero-filled grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    /// Wrap an existing row-major buffer, validating its length.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> DriftResult<Self> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(DriftError::validation(format!(
                "grid buffer length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Grid filled with a single value.
    pub fn splat(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells (`width * height`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Value at `(x, y)`. Callers must stay in bounds.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Minimum and maximum over the grid, or `None` when empty.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied();
        let first = it.next()?;
        let mut lo = first;
        let mut hi = first;
        for v in it {
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
        Some((lo, hi))
    }

    /// Return `true` when every cell is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}
