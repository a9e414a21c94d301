use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raw::types::{RawImage, WindowParams};
use crate::image_pipeline::resample::types::{BitDepth, GrayPlane};

/// Maps one rescaled value through the window `[min, max]` onto `[0, max_value]`.
/// Values at or beyond either bound saturate; values inside are truncated.
pub fn window_value(rescaled: f64, min: f64, max: f64, max_value: u16) -> u16 {
    if rescaled >= max {
        max_value
    } else if rescaled <= min {
        0
    } else {
        ((rescaled - min) / (max - min) * f64::from(max_value)) as u16
    }
}

/// Applies rescale slope/intercept and the VOI window to every pixel.
pub fn apply_window(raw: &RawImage, bit_depth: BitDepth) -> Result<GrayPlane> {
    if raw.rows == 0 || raw.cols == 0 || raw.pixels.len() != raw.rows * raw.cols {
        return Err(PipelineError::InvalidDimensions(raw.cols, raw.rows));
    }

    let slope = raw.rescale_slope;
    let intercept = raw.rescale_intercept;
    let window = resolve_window(raw)?;
    let (min, max) = (window.min(), window.max());
    let max_value = bit_depth.max_value();

    let data = raw
        .pixels
        .iter()
        .map(|&p| window_value(f64::from(p) * slope + intercept, min, max, max_value))
        .collect();

    Ok(GrayPlane {
        rows: raw.rows,
        cols: raw.cols,
        data,
    })
}

/// The source window, or the full rescaled value range when there is none.
fn resolve_window(raw: &RawImage) -> Result<WindowParams> {
    let window = match raw.window {
        Some(window) => window,
        None => {
            let (lo, hi) = raw.pixels.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &p| {
                let v = f64::from(p) * raw.rescale_slope + raw.rescale_intercept;
                (lo.min(v), hi.max(v))
            });
            WindowParams::new((lo + hi) / 2.0, hi - lo)
        }
    };

    if !(window.width > 0.0) || !window.center.is_finite() || !window.width.is_finite() {
        return Err(PipelineError::DegenerateWindow {
            center: window.center,
            width: window.width,
        });
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_at_and_beyond_bounds() {
        // window [0, 256]
        assert_eq!(window_value(256.0, 0.0, 256.0, 255), 255);
        assert_eq!(window_value(300.0, 0.0, 256.0, 255), 255);
        assert_eq!(window_value(0.0, 0.0, 256.0, 255), 0);
        assert_eq!(window_value(-40.0, 0.0, 256.0, 255), 0);
        assert_eq!(window_value(300.0, 0.0, 256.0, 65535), 65535);
    }

    #[test]
    fn test_linear_inside_window_truncates() {
        assert_eq!(window_value(128.0, 0.0, 256.0, 255), 127);
        assert_eq!(window_value(255.0, 0.0, 256.0, 255), 254);
        assert_eq!(window_value(1.0, 0.0, 256.0, 255), 0);
    }

    #[test]
    fn test_rescale_applies_before_window() {
        let raw = RawImage::new(1, 4, vec![0, 1000, 1024, 2000])
            .with_rescale(1.0, -1024.0)
            .with_window(40.0, 400.0);
        let plane = apply_window(&raw, BitDepth::Eight).unwrap();
        // -1024 -> 0, -24 -> inside, 0 -> inside, 976 -> saturated
        assert_eq!(plane.data[0], 0);
        assert_eq!(plane.data[1], ((-24.0 + 160.0) / 400.0 * 255.0) as u16);
        assert_eq!(plane.data[2], (160.0 / 400.0 * 255.0) as u16);
        assert_eq!(plane.data[3], 255);
    }

    #[test]
    fn test_zero_width_is_degenerate() {
        let raw = RawImage::new(1, 2, vec![1, 2]).with_window(128.0, 0.0);
        let result = apply_window(&raw, BitDepth::Eight);
        assert!(matches!(result, Err(PipelineError::DegenerateWindow { .. })));
    }

    #[test]
    fn test_missing_window_uses_value_range() {
        let raw = RawImage::new(1, 3, vec![100, 150, 200]);
        let plane = apply_window(&raw, BitDepth::Eight).unwrap();
        assert_eq!(plane.data, vec![0, 127, 255]);

        let flat = RawImage::new(1, 2, vec![7, 7]);
        assert!(matches!(
            apply_window(&flat, BitDepth::Eight),
            Err(PipelineError::DegenerateWindow { .. })
        ));
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let raw = RawImage::new(2, 2, vec![0; 3]).with_window(1.0, 2.0);
        assert!(matches!(
            apply_window(&raw, BitDepth::Eight),
            Err(PipelineError::InvalidDimensions(2, 2))
        ));
    }
}
