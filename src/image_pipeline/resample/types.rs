//! Resampling data types

use serde::Deserialize;

/// Height of the canonical frame cropped out of every source image
pub const CANONICAL_ROWS: usize = 1024;
/// Width of the canonical frame cropped out of every source image
pub const CANONICAL_COLS: usize = 2048;

/// Output bit depth of the windowed and resampled image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// `2^bits - 1`
    pub fn max_value(self) -> u16 {
        match self {
            BitDepth::Eight => u16::from(u8::MAX),
            BitDepth::Sixteen => u16::MAX,
        }
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = String;

    fn try_from(bits: u8) -> std::result::Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(format!("unsupported bit depth {}, expected 8 or 16", other)),
        }
    }
}

/// Single-channel intermediate image, values already in the target bit depth
#[derive(Debug, Clone, PartialEq)]
pub struct GrayPlane {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<u16>,
}

impl GrayPlane {
    pub fn at(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.cols + col]
    }
}

/// Image handed to the detector
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalImage {
    /// Detector input width in pixels
    pub width: usize,
    /// Detector input height in pixels
    pub height: usize,
    pub bit_depth: BitDepth,
    /// Row-major samples, each within `0..=bit_depth.max_value()`
    pub data: Vec<u16>,
}

impl CanonicalImage {
    pub fn at(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }
}

/// Crop offsets into the source and the detector-to-canonical scale ratios
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// `(rows - 1024) / 2`, truncated
    pub row_offset: usize,
    /// `(cols - 2048) / 2`, truncated
    pub col_offset: usize,
    /// `2048 / detector_width`
    pub scale_x: f64,
    /// `1024 / detector_height`
    pub scale_y: f64,
}

impl Transform {
    pub fn new(row_offset: usize, col_offset: usize, detector_width: usize, detector_height: usize) -> Self {
        Self {
            row_offset,
            col_offset,
            scale_x: CANONICAL_COLS as f64 / detector_width as f64,
            scale_y: CANONICAL_ROWS as f64 / detector_height as f64,
        }
    }
}
