//! Source image reading module
//!
//! This module turns an encoded diagnostic image into pixels plus the identity
//! attributes the presentation state must reference.

mod dicom_reader;
mod reader;
pub mod types;

pub use dicom_reader::DicomFileReader;
pub use reader::SourceImageReader;
pub use types::{RawImage, SourceImage, SourceMetadata, WindowParams};
