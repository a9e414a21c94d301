use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode DICOM data: {0}")]
    DecodeError(String),

    #[error("Failed to encode data: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Source frame {rows}x{cols} is smaller than the canonical 1024x2048 frame")]
    FrameTooSmall { rows: usize, cols: usize },

    #[error("Degenerate window: center={center}, width={width}")]
    DegenerateWindow { center: f64, width: f64 },

    #[error("Detector failed: {0}")]
    DetectionError(String),

    #[error("Source metadata is missing required attribute {0}")]
    IncompleteSourceMetadata(&'static str),

    #[error("Association rejected by {peer}: {reason}")]
    AssociationRejected { peer: String, reason: String },

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage a unit was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ReadSource,
    Resample,
    Detect,
    MapBack,
    BuildPresentation,
    WriteOutput,
    Transmit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ReadSource => "read_source",
            Stage::Resample => "resample",
            Stage::Detect => "detect",
            Stage::MapBack => "map_back",
            Stage::BuildPresentation => "build_presentation",
            Stage::WriteOutput => "write_output",
            Stage::Transmit => "transmit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work abandoned by the orchestrator. Only the batch layer builds these.
#[derive(Error, Debug)]
#[error("Unit {unit} aborted during {stage}: {source}")]
pub struct UnitAborted {
    pub unit: String,
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl UnitAborted {
    pub fn new(unit: impl Into<String>, stage: Stage, source: PipelineError) -> Self {
        Self {
            unit: unit.into(),
            stage,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_aborted_display_names_stage_and_cause() {
        let err = UnitAborted::new(
            "ct_001.dcm",
            Stage::Resample,
            PipelineError::FrameTooSmall { rows: 512, cols: 512 },
        );
        let msg = err.to_string();
        assert!(msg.contains("ct_001.dcm"));
        assert!(msg.contains("resample"));
        assert!(msg.contains("512x512"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::IoError(_)));
    }
}
