//! Resampling module
//!
//! Windows the source intensities, crops the fixed 1024x2048 canonical frame
//! out of the centre of the image, and bilinearly resizes it to the detector's
//! input resolution. The returned [`Transform`] carries what the coordinate
//! mapper needs to undo the crop and the scale.

mod bilinear;
mod crop;
mod resampler;
pub mod types;
mod window;

pub use bilinear::resize_bilinear;
pub use crop::{canonical_offsets, crop_canonical};
pub use resampler::{resample, Resampler};
pub use types::{BitDepth, CanonicalImage, GrayPlane, Transform, CANONICAL_COLS, CANONICAL_ROWS};
pub use window::{apply_window, window_value};
