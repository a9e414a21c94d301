use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::resample::CanonicalImage;

pub trait TiffWriter: Send + Sync {
    fn write_tiff(&self, image: &CanonicalImage, output: &mut dyn Write) -> Result<()>;
}
