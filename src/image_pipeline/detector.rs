//! Detection module
//!
//! The detector is an external capability: it receives the resampled image and
//! returns axis-aligned boxes with confidences in the same pixel space.

mod command_detector;
pub mod types;

pub use command_detector::CommandDetector;
pub use types::{Detection, Detector};
