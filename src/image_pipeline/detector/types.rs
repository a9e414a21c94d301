use std::path::Path;

use serde::Deserialize;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::resample::CanonicalImage;

/// A box in detector pixel space
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(alias = "conf")]
    pub confidence: f64,
}

impl Detection {
    /// Rejects non-finite values, negative extents, and confidences outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.x, self.y, self.w, self.h, self.confidence]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(PipelineError::DetectionError(format!(
                "non-finite value in {:?}",
                self
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(PipelineError::DetectionError(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.w < 0.0 || self.h < 0.0 {
            return Err(PipelineError::DetectionError(format!(
                "negative box extent {}x{}",
                self.w, self.h
            )));
        }
        Ok(())
    }
}

pub trait Detector: Send + Sync {
    /// Boxes found in `image`, in no particular order. May be empty.
    ///
    /// `scratch` is the unit's private staging directory.
    fn predict(&self, image: &CanonicalImage, scratch: &Path) -> Result<Vec<Detection>>;
}
