use std::io::Write;

use tiff::encoder::colortype::{Gray16, Gray8};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::resample::{BitDepth, CanonicalImage};
use crate::image_pipeline::tiff::writer::TiffWriter;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    Lzw,
    Deflate,
}

impl TiffCompression {
    fn encoder_setting(self) -> Compression {
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::Deflate => Compression::Deflate(DeflateLevel::Fast),
        }
    }
}

/// Writes Gray8 or Gray16 depending on the image's bit depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTiffWriter {
    compression: TiffCompression,
}

impl StandardTiffWriter {
    pub fn new(compression: TiffCompression) -> Self {
        Self { compression }
    }
}

impl TiffWriter for StandardTiffWriter {
    fn write_tiff(&self, image: &CanonicalImage, output: &mut dyn Write) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{} at {} bits",
            image.width,
            image.height,
            image.bit_depth.bits()
        );

        let mut buffer = Vec::new();

        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| PipelineError::EncodeError(e.to_string()))?
            .with_compression(self.compression.encoder_setting());

        let width = image.width as u32;
        let height = image.height as u32;
        let written = match image.bit_depth {
            BitDepth::Eight => {
                let samples: Vec<u8> = image.data.iter().map(|&v| v.min(255) as u8).collect();
                encoder.write_image::<Gray8>(width, height, &samples)
            }
            BitDepth::Sixteen => encoder.write_image::<Gray16>(width, height, &image.data),
        };
        written.map_err(|e| PipelineError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}
