//! Bilinear resize with corner-aligned sampling.
//!
//! Output pixel `(x, y)` samples the source at `(x * rx, y * ry)` where
//! `rx = (src_cols - 1) / (dst_width - 1)`, so the first and last output
//! columns land exactly on the first and last source columns. Neighbour
//! indices are clamped to the source edge.

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::resample::types::{BitDepth, GrayPlane};

fn ratio(src: usize, dst: usize) -> f64 {
    if dst > 1 && src > 1 {
        (src - 1) as f64 / (dst - 1) as f64
    } else {
        0.0
    }
}

/// Resizes `src` to `width` x `height`, rounding half to even and clamping
/// to the range of `bit_depth`.
pub fn resize_bilinear(src: &GrayPlane, width: usize, height: usize, bit_depth: BitDepth) -> Result<Vec<u16>> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions(width, height));
    }
    if src.rows == 0 || src.cols == 0 || src.data.len() != src.rows * src.cols {
        return Err(PipelineError::InvalidDimensions(src.cols, src.rows));
    }

    let rx = ratio(src.cols, width);
    let ry = ratio(src.rows, height);
    let max_value = f64::from(bit_depth.max_value());
    let last_col = src.cols - 1;
    let last_row = src.rows - 1;

    // Column taps are identical for every row.
    let col_taps: Vec<(usize, usize, f64)> = (0..width)
        .map(|x| {
            let sx = x as f64 * rx;
            let x0 = (sx.floor() as usize).min(last_col);
            let x1 = (x0 + 1).min(last_col);
            (x0, x1, sx - x0 as f64)
        })
        .collect();

    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = y as f64 * ry;
        let y0 = (sy.floor() as usize).min(last_row);
        let y1 = (y0 + 1).min(last_row);
        let wy = sy - y0 as f64;

        let top = &src.data[y0 * src.cols..(y0 + 1) * src.cols];
        let bottom = &src.data[y1 * src.cols..(y1 + 1) * src.cols];

        for &(x0, x1, wx) in &col_taps {
            let a = f64::from(top[x0]);
            let b = f64::from(top[x1]);
            let c = f64::from(bottom[x0]);
            let d = f64::from(bottom[x1]);

            let upper = a + (b - a) * wx;
            let lower = c + (d - c) * wx;
            let value = upper + (lower - upper) * wy;

            out.push(value.round_ties_even().clamp(0.0, max_value) as u16);
        }
    }
    Ok(out)
}
