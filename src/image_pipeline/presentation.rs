//! Presentation state module
//!
//! Builds the Grayscale Softcopy Presentation State that overlays mapped
//! regions on the unmodified source image, and encodes it as a DICOM data set.

mod builder;
mod color;
mod encode;
pub mod types;

pub use builder::PresentationBuilder;
pub use color::tier_color;
pub use types::{Annotation, CieLabColor, ConfidenceTier, PresentationRecord, TextLabel};
