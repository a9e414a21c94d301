//! Coordinate mapping from detector space back to the source image
//!
//! Inverts the crop and scale recorded in a [`Transform`] at rectangle
//! granularity. Results are not clamped to the image bounds.

use crate::image_pipeline::detector::Detection;
use crate::image_pipeline::resample::{Transform, CANONICAL_COLS, CANONICAL_ROWS};

/// A detection expressed in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedRegion {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub confidence: f64,
}

impl MappedRegion {
    /// Corners in the order top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.w, self.y + self.h);
        [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }

    /// Closed outline: the four corners followed by the first one again
    pub fn polygon(&self) -> [(f64, f64); 5] {
        let [tl, tr, br, bl] = self.corners();
        [tl, tr, br, bl, tl]
    }
}

/// Projects a detector-space box onto the original `width` x `height` image.
///
/// `x' = x * scale_x + (width - 2048) / 2` and likewise for `y`, with the
/// offset computed in floating point.
pub fn map_back(detection: &Detection, transform: &Transform, width: usize, height: usize) -> MappedRegion {
    let col_offset = (width as f64 - CANONICAL_COLS as f64) / 2.0;
    let row_offset = (height as f64 - CANONICAL_ROWS as f64) / 2.0;

    MappedRegion {
        x: detection.x * transform.scale_x + col_offset,
        y: detection.y * transform.scale_y + row_offset,
        w: detection.w * transform.scale_x,
        h: detection.h * transform.scale_y,
        confidence: detection.confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x: f64, y: f64, w: f64, h: f64) -> Detection {
        Detection {
            x,
            y,
            w,
            h,
            confidence: 0.9,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_mapping() {
        let transform = Transform::new(88, 76, 800, 400);
        let region = map_back(&detection(100.0, 50.0, 20.0, 10.0), &transform, 2200, 1200);

        assert!(close(region.x, 332.0));
        assert!(close(region.y, 216.0));
        assert!(close(region.w, 51.2));
        assert!(close(region.h, 25.6));
        assert_eq!(region.confidence, 0.9);
    }

    #[test]
    fn test_odd_surplus_uses_half_pixel_offset() {
        // crop offset is truncated to 1, the inverse uses 1.5
        let transform = Transform::new(1, 1, 2048, 1024);
        let region = map_back(&detection(0.0, 0.0, 4.0, 4.0), &transform, 2051, 1027);
        assert!(close(region.x, 1.5));
        assert!(close(region.y, 1.5));
        assert!(close(region.w, 4.0));
    }

    #[test]
    fn test_no_clamping_outside_image() {
        let transform = Transform::new(0, 0, 1024, 512);
        let region = map_back(&detection(1020.0, 510.0, 50.0, 50.0), &transform, 2048, 1024);
        assert!(region.x + region.w > 2048.0);
        assert!(region.y + region.h > 1024.0);
    }

    #[test]
    fn test_polygon_is_closed_clockwise() {
        let region = MappedRegion {
            x: 10.0,
            y: 20.0,
            w: 5.0,
            h: 2.0,
            confidence: 0.7,
        };
        let polygon = region.polygon();
        assert_eq!(polygon[0], (10.0, 20.0));
        assert_eq!(polygon[1], (15.0, 20.0));
        assert_eq!(polygon[2], (15.0, 22.0));
        assert_eq!(polygon[3], (10.0, 22.0));
        assert_eq!(polygon[4], polygon[0]);
    }
}
