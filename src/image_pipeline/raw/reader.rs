use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::SourceImage;

pub trait SourceImageReader: Send + Sync {
    fn read_source(&self, data: &[u8]) -> Result<SourceImage>;
}
