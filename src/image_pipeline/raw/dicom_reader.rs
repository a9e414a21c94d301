//! Source reader for DICOM Part 10 files.
//!
//! Supports single-frame grayscale images with native (uncompressed) pixel data
//! in implicit or explicit VR little endian. Compressed transfer syntaxes and
//! colour images are rejected with `UnsupportedFormat`.

use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::dicom::{read_part10, tags, DataSet, Tag};
use crate::image_pipeline::raw::reader::SourceImageReader;
use crate::image_pipeline::raw::types::{RawImage, SourceImage, SourceMetadata, WindowParams};

/// Source reader backed by the crate's own DICOM decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomFileReader;

impl SourceImageReader for DicomFileReader {
    /// Decodes a DICOM file into pixels and identity attributes.
    ///
    /// This method:
    /// 1. Parses the file meta group and the data set
    /// 2. Unpacks native pixel data, applying `BitsStored` and the pixel sign
    /// 3. Collects windowing, rescale, and identity attributes
    ///
    /// A missing VOI window is not an error here; the resampler falls back to
    /// the image's own value range.
    fn read_source(&self, data: &[u8]) -> Result<SourceImage> {
        debug!("Decoding DICOM source, {} bytes", data.len());

        let file = read_part10(data)?;
        let ds = &file.dataset;

        let rows = ds
            .uint16(tags::ROWS)
            .ok_or_else(|| PipelineError::DecodeError("missing Rows".to_string()))? as usize;
        let cols = ds
            .uint16(tags::COLUMNS)
            .ok_or_else(|| PipelineError::DecodeError("missing Columns".to_string()))? as usize;

        let samples = ds.uint16(tags::SAMPLES_PER_PIXEL).unwrap_or(1);
        if samples != 1 {
            return Err(PipelineError::UnsupportedFormat(format!(
                "{} samples per pixel",
                samples
            )));
        }

        let pixels = unpack_pixels(ds, rows, cols)?;
        debug!("Decoded image: {}x{} ({:?})", cols, rows, file.transfer_syntax);

        let window = match (first_float(ds, tags::WINDOW_CENTER), first_float(ds, tags::WINDOW_WIDTH)) {
            (Some(center), Some(width)) => Some(WindowParams::new(center, width)),
            _ => None,
        };

        let raw = RawImage {
            rows,
            cols,
            pixels,
            window,
            rescale_slope: first_float(ds, tags::RESCALE_SLOPE).unwrap_or(1.0),
            rescale_intercept: first_float(ds, tags::RESCALE_INTERCEPT).unwrap_or(0.0),
        };

        Ok(SourceImage {
            raw,
            metadata: read_metadata(ds),
        })
    }
}

fn first_float(ds: &DataSet, tag: Tag) -> Option<f64> {
    ds.float(tag).filter(|v| v.is_finite())
}

fn read_metadata(ds: &DataSet) -> SourceMetadata {
    SourceMetadata {
        patient_name: ds.string(tags::PATIENT_NAME),
        patient_id: ds.string(tags::PATIENT_ID),
        patient_age: ds.string(tags::PATIENT_AGE),
        patient_sex: ds.string(tags::PATIENT_SEX),
        study_date: ds.string(tags::STUDY_DATE),
        study_time: ds.string(tags::STUDY_TIME),
        accession_number: ds.string(tags::ACCESSION_NUMBER),
        study_description: ds.string(tags::STUDY_DESCRIPTION),
        study_instance_uid: ds.string(tags::STUDY_INSTANCE_UID),
        study_id: ds.string(tags::STUDY_ID),
        series_instance_uid: ds.string(tags::SERIES_INSTANCE_UID),
        series_number: ds.int(tags::SERIES_NUMBER),
        instance_number: ds.int(tags::INSTANCE_NUMBER),
        sop_class_uid: ds.string(tags::SOP_CLASS_UID),
        sop_instance_uid: ds.string(tags::SOP_INSTANCE_UID),
        rows: ds.uint16(tags::ROWS),
        columns: ds.uint16(tags::COLUMNS),
    }
}

fn unpack_pixels(ds: &DataSet, rows: usize, cols: usize) -> Result<Vec<i32>> {
    let bits_allocated = ds.uint16(tags::BITS_ALLOCATED).unwrap_or(16);
    let bits_stored = ds.uint16(tags::BITS_STORED).unwrap_or(bits_allocated);
    let signed = ds.uint16(tags::PIXEL_REPRESENTATION).unwrap_or(0) == 1;

    if bits_allocated != 8 && bits_allocated != 16 {
        return Err(PipelineError::UnsupportedFormat(format!(
            "{} bits allocated",
            bits_allocated
        )));
    }
    if bits_stored == 0 || bits_stored > bits_allocated {
        return Err(PipelineError::DecodeError(format!(
            "bits stored {} inconsistent with bits allocated {}",
            bits_stored, bits_allocated
        )));
    }

    let data = ds
        .bytes(tags::PIXEL_DATA)
        .ok_or_else(|| PipelineError::DecodeError("missing Pixel Data".to_string()))?;

    let count = rows * cols;
    let bytes_per_pixel = usize::from(bits_allocated / 8);
    if data.len() < count * bytes_per_pixel {
        return Err(PipelineError::DecodeError(format!(
            "pixel data holds {} bytes, {}x{} at {} bits needs {}",
            data.len(),
            cols,
            rows,
            bits_allocated,
            count * bytes_per_pixel
        )));
    }

    let mask: u32 = (1u32 << bits_stored) - 1;
    let sign_bit: u32 = 1u32 << (bits_stored - 1);

    let decode = |stored: u32| -> i32 {
        let v = stored & mask;
        if signed && v & sign_bit != 0 {
            v as i32 - (1i32 << bits_stored)
        } else {
            v as i32
        }
    };

    let pixels = if bytes_per_pixel == 1 {
        data[..count].iter().map(|&b| decode(u32::from(b))).collect()
    } else {
        data[..count * 2]
            .chunks_exact(2)
            .map(|p| decode(u32::from(u16::from_le_bytes([p[0], p[1]]))))
            .collect()
    };
    Ok(pixels)
}
