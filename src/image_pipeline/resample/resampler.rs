use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::config::ResampleConfig;
use crate::image_pipeline::raw::types::RawImage;
use crate::image_pipeline::resample::bilinear::resize_bilinear;
use crate::image_pipeline::resample::crop::crop_canonical;
use crate::image_pipeline::resample::types::{BitDepth, CanonicalImage, Transform};
use crate::image_pipeline::resample::window::apply_window;

/// Produces detector input at a fixed resolution and bit depth
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    detector_width: usize,
    detector_height: usize,
    bit_depth: BitDepth,
}

impl Resampler {
    pub fn new(config: &ResampleConfig) -> Result<Self> {
        if config.detector_width == 0 || config.detector_height == 0 {
            return Err(PipelineError::InvalidDimensions(
                config.detector_width,
                config.detector_height,
            ));
        }
        Ok(Self {
            detector_width: config.detector_width,
            detector_height: config.detector_height,
            bit_depth: config.bit_depth,
        })
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Window, crop, and resize `raw`.
    ///
    /// Returns the detector image together with the transform needed to map
    /// detector coordinates back onto the source.
    #[instrument(skip(self, raw), fields(rows = raw.rows, cols = raw.cols))]
    pub fn resample(&self, raw: &RawImage) -> Result<(CanonicalImage, Transform)> {
        let windowed = apply_window(raw, self.bit_depth)?;
        let (canonical, row_offset, col_offset) = crop_canonical(&windowed)?;
        debug!(row_offset, col_offset, "Cropped canonical frame");

        let data = resize_bilinear(
            &canonical,
            self.detector_width,
            self.detector_height,
            self.bit_depth,
        )?;

        let image = CanonicalImage {
            width: self.detector_width,
            height: self.detector_height,
            bit_depth: self.bit_depth,
            data,
        };
        let transform = Transform::new(
            row_offset,
            col_offset,
            self.detector_width,
            self.detector_height,
        );
        Ok((image, transform))
    }
}

/// One-shot form of [`Resampler::resample`].
pub fn resample(
    raw: &RawImage,
    detector_width: usize,
    detector_height: usize,
    bit_depth: BitDepth,
) -> Result<(CanonicalImage, Transform)> {
    let config = ResampleConfig {
        detector_width,
        detector_height,
        bit_depth,
    };
    Resampler::new(&config)?.resample(raw)
}
