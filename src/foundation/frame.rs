use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{DriftError, DriftResult};

/// One W×H RGB8 raster: the source photo or one rendered output frame.
///
/// `data` is row-major with 3 bytes per pixel (`width * height * 3` total).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgb {
    /// Wrap an existing rgb24 buffer, validating dimensions and length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> DriftResult<Self> {
        if width == 0 || height == 0 {
            return Err(DriftError::input("image must have non-zero area"));
        }
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return Err(DriftError::input(format!(
                "rgb buffer length {} does not match {}x{}x3",
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

    /// Decode an image file into RGB8. Fatal on unreadable/undecodable input.
    pub fn from_path(path: impl AsRef<Path>) -> DriftResult<Self> {
        let path = path.as_ref();
        let dyn_img = image::open(path)
            .with_context(|| format!("decode source image '{}'", path.display()))
            .map_err(|e| DriftError::input(format!("{e:#}")))?;
        let rgb = dyn_img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_raw(width, height, rgb.into_raw())
    }

    /// Write the frame as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> DriftResult<()> {
        let path = path.as_ref();
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }

    /// Pixel at `(x, y)`. Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_zero_area_and_bad_length() {
        assert!(FrameRgb::from_raw(0, 4, Vec::new()).is_err());
        assert!(FrameRgb::from_raw(4, 0, Vec::new()).is_err());
        assert!(FrameRgb::from_raw(2, 2, vec![0u8; 11]).is_err());
        assert!(FrameRgb::from_raw(2, 2, vec![0u8; 12]).is_ok());
    }

    #[test]
    fn pixel_indexing_is_row_major() {
        let mut data = vec![0u8; 2 * 2 * 3];
        data[3..6].copy_from_slice(&[10, 20, 30]); // (1, 0)
        data[6..9].copy_from_slice(&[40, 50, 60]); // (0, 1)
        let f = FrameRgb::from_raw(2, 2, data).unwrap();
        assert_eq!(f.pixel(1, 0), [10, 20, 30]);
        assert_eq!(f.pixel(0, 1), [40, 50, 60]);
    }

    #[test]
    fn from_path_round_trips_through_png() {
        let dir = std::env::temp_dir().join(format!("depthdrift_frame_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("px.png");

        let src = FrameRgb::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        src.save_png(&path).unwrap();

        let back = FrameRgb::from_path(&path).unwrap();
        assert_eq!(back, src);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
