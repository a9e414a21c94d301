//! DICOM annotation pipeline
//!
//! This module turns a diagnostic image into a Grayscale Softcopy Presentation
//! State overlay and ships it to an archive. Each stage lives in its own module:
//! source reading, resampling, detection, coordinate mapping, presentation
//! building, and network transmission, with batch orchestration on top.

pub mod batch;
pub mod common;
pub mod config;
pub mod detector;
pub mod dicom;
pub mod geometry;
pub mod presentation;
pub mod raw;
pub mod resample;
pub mod tiff;
pub mod transmit;

pub use common::{
    PipelineError,
    PipelineTimings,
    Result,
    Stage,
    StepTiming,
    Timer,
    UnitAborted,
};

pub use config::{
    ArchiveConfig,
    BatchConfig,
    DetectorConfig,
    LoggingConfig,
    PipelineConfig,
    PipelineConfigBuilder,
    ResampleConfig,
};

pub use raw::{
    DicomFileReader,
    RawImage,
    SourceImage,
    SourceImageReader,
    SourceMetadata,
    WindowParams,
};

pub use resample::{
    BitDepth,
    CanonicalImage,
    Resampler,
    Transform,
};

pub use detector::{
    CommandDetector,
    Detection,
    Detector,
};

pub use geometry::{map_back, MappedRegion};

pub use presentation::{
    Annotation,
    CieLabColor,
    ConfidenceTier,
    PresentationBuilder,
    PresentationRecord,
};

pub use transmit::{
    ArchiveTransmitter,
    DicomTransmitter,
    TransmissionOutcome,
};

pub use batch::{
    AnnotationPipeline,
    BatchReport,
    UnitOutcome,
};
