//! TIFF staging module
//!
//! Encodes the detector input as a single-channel TIFF for model runners that
//! consume image files.

mod standard_tiff_writer;
mod writer;

pub use standard_tiff_writer::{StandardTiffWriter, TiffCompression};
pub use writer::TiffWriter;
