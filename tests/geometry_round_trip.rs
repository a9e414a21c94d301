use gsps_annotator::image_pipeline::resample::resample;
use gsps_annotator::image_pipeline::{map_back, BitDepth, CanonicalImage, Detection, RawImage};

/// Bounding box of the pixels above half scale, as a perfect detector would report it.
fn threshold_detector(image: &CanonicalImage) -> Detection {
    let threshold = image.bit_depth.max_value() / 2;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);
    for y in 0..image.height {
        for x in 0..image.width {
            if image.at(x, y) > threshold {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    assert!(min_x <= max_x, "nothing above threshold");
    Detection {
        x: min_x as f64,
        y: min_y as f64,
        w: (max_x - min_x + 1) as f64,
        h: (max_y - min_y + 1) as f64,
        confidence: 0.9,
    }
}

/// Source image with a bright rectangle at `(x, y, w, h)` on a dark background.
fn image_with_box(rows: usize, cols: usize, bbox: (usize, usize, usize, usize)) -> RawImage {
    let (bx, by, bw, bh) = bbox;
    let mut pixels = vec![0i32; rows * cols];
    for row in by..by + bh {
        for col in bx..bx + bw {
            pixels[row * cols + col] = 1000;
        }
    }
    RawImage::new(rows, cols, pixels).with_window(500.0, 1000.0)
}

fn assert_round_trip(rows: usize, cols: usize, bbox: (usize, usize, usize, usize), detector: (usize, usize), bit_depth: BitDepth) {
    let raw = image_with_box(rows, cols, bbox);
    let (canonical, transform) = resample(&raw, detector.0, detector.1, bit_depth).unwrap();
    let detection = threshold_detector(&canonical);
    let region = map_back(&detection, &transform, cols, rows);

    let tolerance_x = 1.5 * transform.scale_x;
    let tolerance_y = 1.5 * transform.scale_y;
    let (bx, by, bw, bh) = bbox;
    assert!((region.x - bx as f64).abs() <= tolerance_x, "x {} vs {}", region.x, bx);
    assert!((region.y - by as f64).abs() <= tolerance_y, "y {} vs {}", region.y, by);
    assert!((region.w - bw as f64).abs() <= 2.0 * tolerance_x, "w {} vs {}", region.w, bw);
    assert!((region.h - bh as f64).abs() <= 2.0 * tolerance_y, "h {} vs {}", region.h, bh);
}

#[test]
fn box_survives_resample_and_map_back() {
    assert_round_trip(1100, 2200, (1100, 500, 200, 100), (1024, 512), BitDepth::Eight);
}

#[test]
fn box_survives_at_sixteen_bits() {
    assert_round_trip(1100, 2200, (1100, 500, 200, 100), (1024, 512), BitDepth::Sixteen);
}

#[test]
fn box_survives_odd_sized_source() {
    assert_round_trip(1025, 2049, (300, 200, 160, 120), (1024, 512), BitDepth::Eight);
}

#[test]
fn box_survives_non_uniform_scale() {
    assert_round_trip(1200, 2200, (600, 300, 400, 200), (800, 400), BitDepth::Eight);
}
