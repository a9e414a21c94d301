use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::resample::types::{GrayPlane, CANONICAL_COLS, CANONICAL_ROWS};

/// Top-left corner `(row_offset, col_offset)` of the centred canonical frame.
pub fn canonical_offsets(rows: usize, cols: usize) -> Result<(usize, usize)> {
    if rows < CANONICAL_ROWS || cols < CANONICAL_COLS {
        return Err(PipelineError::FrameTooSmall { rows, cols });
    }
    Ok(((rows - CANONICAL_ROWS) / 2, (cols - CANONICAL_COLS) / 2))
}

/// Cuts the 1024x2048 canonical frame out of the centre of `plane`.
pub fn crop_canonical(plane: &GrayPlane) -> Result<(GrayPlane, usize, usize)> {
    let (row_offset, col_offset) = canonical_offsets(plane.rows, plane.cols)?;

    let mut data = Vec::with_capacity(CANONICAL_ROWS * CANONICAL_COLS);
    for row in row_offset..row_offset + CANONICAL_ROWS {
        let start = row * plane.cols + col_offset;
        data.extend_from_slice(&plane.data[start..start + CANONICAL_COLS]);
    }

    let cropped = GrayPlane {
        rows: CANONICAL_ROWS,
        cols: CANONICAL_COLS,
        data,
    };
    Ok((cropped, row_offset, col_offset))
}
