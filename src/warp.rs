//! Bilinear image resampling through a displacement field, with a reflect border policy.

use crate::field::DisplacementField;
use crate::foundation::error::{DriftError, DriftResult};
use crate::foundation::frame::FrameRgb;

/// Resample `src` at the coordinates carried by `field`.
///
/// Each output pixel bilinearly interpolates the four integer taps around its sample
/// coordinate. Taps that fall outside `[0, W) x [0, H)` are mirrored back into range
/// (edge pixel included in the mirror, so `-1 -> 0`, `-2 -> 1`, `W -> W-1`), which
/// avoids the hard seams that clamping or wrapping would show as content shifts.
///
/// Output dimensions always equal source dimensions.
pub fn resample(src: &FrameRgb, field: &DisplacementField) -> DriftResult<FrameRgb> {
    let mut out = vec![0u8; src.data.len()];
    resample_into(src, field, &mut out)?;
    FrameRgb::from_raw(src.width, src.height, out)
}

/// [`resample`] into a caller-owned buffer of length `width * height * 3`.
pub fn resample_into(src: &FrameRgb, field: &DisplacementField, out: &mut [u8]) -> DriftResult<()> {
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 {
        return Err(DriftError::input("cannot resample a zero-area image"));
    }
    if field.width() != w || field.height() != h {
        return Err(DriftError::validation(format!(
            "field {}x{} does not match image {}x{}",
            field.width(),
            field.height(),
            w,
            h
        )));
    }
    if out.len() != src.data.len() {
        return Err(DriftError::validation(
            "resample output buffer must match width*height*3",
        ));
    }

    let sx = field.sample_x().data();
    let sy = field.sample_y().data();
    let data = &src.data;
    let stride = (w as usize) * 3;

    for (i, px) in out.chunks_exact_mut(3).enumerate() {
        let x = sx[i];
        let y = sy[i];

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let x0 = x0 as i64;
        let y0 = y0 as i64;
        let xa = reflect_index(x0, w);
        let xb = reflect_index(x0 + 1, w);
        let ya = reflect_index(y0, h);
        let yb = reflect_index(y0 + 1, h);

        let row_a = ya * stride;
        let row_b = yb * stride;
        let w00 = (1.0 - fx) * (1.0 - fy);
        let w10 = fx * (1.0 - fy);
        let w01 = (1.0 - fx) * fy;
        let w11 = fx * fy;

        for c in 0..3 {
            let p00 = data[row_a + xa * 3 + c] as f32;
            let p10 = data[row_a + xb * 3 + c] as f32;
            let p01 = data[row_b + xa * 3 + c] as f32;
            let p11 = data[row_b + xb * 3 + c] as f32;
            let v = p00 * w00 + p10 * w10 + p01 * w01 + p11 * w11;
            px[c] = (v + 0.5).clamp(0.0, 255.0) as u8;
        }
    }

    Ok(())
}

/// Mirror an integer tap index into `[0, n)` with the edge pixel included in the
/// reflection (`-1 -> 0`, `-2 -> 1`, `n -> n-1`), periodic with period `2n`.
fn reflect_index(i: i64, n: u32) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n { m as usize } else { (period - 1 - m) as usize }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthMap;
    use crate::foundation::grid::ScalarGrid;

    fn uniform_depth(w: u32, h: u32, v: f32) -> DepthMap {
        DepthMap::from_unit_grid(ScalarGrid::splat(w, h, v)).unwrap()
    }

    fn gradient_image(w: u32, h: u32) -> FrameRgb {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push((x * 17 % 256) as u8);
                data.push((y * 31 % 256) as u8);
                data.push(((x + y) * 11 % 256) as u8);
            }
        }
        FrameRgb::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn reflect_index_mirrors_with_edge_included() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(-4, 4), 3);
        assert_eq!(reflect_index(0, 4), 0);
        assert_eq!(reflect_index(3, 4), 3);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(7, 4), 0);
        // Far out of range wraps with period 2n.
        assert_eq!(reflect_index(8, 4), 0);
        assert_eq!(reflect_index(-5, 4), 3);
        // Single-row/column grids always resolve to the only cell.
        assert_eq!(reflect_index(-3, 1), 0);
        assert_eq!(reflect_index(9, 1), 0);
    }

    #[test]
    fn identity_field_reproduces_source_exactly() {
        let src = gradient_image(5, 4);
        let zero = uniform_depth(5, 4, 0.0);
        let mut field = DisplacementField::new(5, 4);
        field.rebuild(&zero, 37.0, -12.0).unwrap();

        let out = resample(&src, &field).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn integer_translation_matches_direct_shift() {
        let src = gradient_image(6, 5);
        let one = uniform_depth(6, 5, 1.0);
        let mut field = DisplacementField::new(6, 5);
        field.rebuild(&one, 2.0, 0.0).unwrap();

        let out = resample(&src, &field).unwrap();
        // Interior pixels read exactly two columns to the right.
        for y in 0..5u32 {
            for x in 0..4u32 {
                assert_eq!(out.pixel(x, y), src.pixel(x + 2, y));
            }
        }
    }

    #[test]
    fn out_of_bounds_reads_are_mirrored_not_clamped() {
        // 4x4 image with distinct red values per column.
        let mut data = Vec::new();
        for _y in 0..4 {
            for x in 0..4u32 {
                data.extend_from_slice(&[(x * 10) as u8, 0, 0]);
            }
        }
        let src = FrameRgb::from_raw(4, 4, data).unwrap();

        // Shift every sample two columns past the left edge: column 0 reads x = -2,
        // which mirrors to column 1 (clamping would duplicate column 0).
        let one = uniform_depth(4, 4, 1.0);
        let mut field = DisplacementField::new(4, 4);
        field.rebuild(&one, -2.0, 0.0).unwrap();

        let out = resample(&src, &field).unwrap();
        for y in 0..4u32 {
            assert_eq!(out.pixel(0, y)[0], 10, "x=-2 must mirror to column 1");
            assert_eq!(out.pixel(1, y)[0], 0, "x=-1 must mirror to column 0");
            assert_eq!(out.pixel(2, y)[0], 0);
            assert_eq!(out.pixel(3, y)[0], 10);
        }
    }

    #[test]
    fn fractional_sample_interpolates_bilinearly() {
        let src = FrameRgb::from_raw(2, 1, vec![0, 0, 0, 100, 200, 40]).unwrap();
        let one = uniform_depth(2, 1, 1.0);
        let mut field = DisplacementField::new(2, 1);
        field.rebuild(&one, 0.5, 0.0).unwrap();

        let out = resample(&src, &field).unwrap();
        // Pixel 0 samples x = 0.5: midpoint of the two source pixels.
        assert_eq!(out.pixel(0, 0), [50, 100, 20]);
    }

    #[test]
    fn constant_image_is_invariant_under_any_field() {
        let src = FrameRgb::from_raw(4, 3, vec![77u8; 4 * 3 * 3]).unwrap();
        let half = uniform_depth(4, 3, 0.5);
        let mut field = DisplacementField::new(4, 3);
        field.rebuild(&half, 9.25, -3.75).unwrap();

        let out = resample(&src, &field).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn output_dimensions_always_match_source() {
        for (w, h) in [(1u32, 1u32), (3, 1), (1, 7), (16, 9)] {
            let src = gradient_image(w, h);
            let d = uniform_depth(w, h, 1.0);
            let mut field = DisplacementField::new(w, h);
            field.rebuild(&d, 3.5, 2.5).unwrap();
            let out = resample(&src, &field).unwrap();
            assert_eq!((out.width, out.height), (w, h));
        }
    }

    #[test]
    fn mismatched_field_is_rejected() {
        let src = gradient_image(4, 4);
        let field = DisplacementField::new(3, 4);
        assert!(resample(&src, &field).is_err());
    }
}
