//! Detector backed by an external model runner.
//!
//! The canonical image is staged as a grayscale TIFF in the unit's staging
//! directory, the configured command
//! is run with the staged path as its last argument, and stdout is parsed as
//! a JSON array of `{x, y, w, h, confidence}` objects (`conf` is accepted as
//! an alias for `confidence`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::config::DetectorConfig;
use crate::image_pipeline::detector::types::{Detection, Detector};
use crate::image_pipeline::resample::CanonicalImage;
use crate::image_pipeline::tiff::{StandardTiffWriter, TiffWriter};

const STAGED_IMAGE_NAME: &str = "canonical.tiff";

pub struct CommandDetector<W: TiffWriter = StandardTiffWriter> {
    program: String,
    args: Vec<String>,
    min_confidence: f64,
    writer: W,
}

impl CommandDetector<StandardTiffWriter> {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        Self::with_writer(config, StandardTiffWriter::default())
    }
}

impl<W: TiffWriter> CommandDetector<W> {
    pub fn with_writer(config: &DetectorConfig, writer: W) -> Result<Self> {
        let (program, args) = config.command.split_first().ok_or_else(|| {
            PipelineError::ConfigError("detector command is empty".to_string())
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            min_confidence: config.min_confidence,
            writer,
        })
    }

    fn stage_image(&self, image: &CanonicalImage, scratch: &Path) -> Result<StagedImage> {
        let path = scratch.join(STAGED_IMAGE_NAME);
        let mut file = fs::File::create(&path)
            .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        let staged = StagedImage(path);
        self.writer.write_tiff(image, &mut file)?;
        Ok(staged)
    }

    fn run(&self, image_path: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .map_err(|e| PipelineError::DetectionError(format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(PipelineError::DetectionError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

impl<W: TiffWriter> Detector for CommandDetector<W> {
    #[instrument(skip(self, image, scratch), fields(program = %self.program))]
    fn predict(&self, image: &CanonicalImage, scratch: &Path) -> Result<Vec<Detection>> {
        let staged = self.stage_image(image, scratch)?;
        let stdout = self.run(&staged.0)?;

        let parsed: Vec<Detection> = serde_json::from_slice(&stdout)
            .map_err(|e| PipelineError::DetectionError(format!("unreadable detector output: {}", e)))?;

        let mut detections = Vec::with_capacity(parsed.len());
        for detection in parsed {
            detection.validate()?;
            if detection.confidence >= self.min_confidence {
                detections.push(detection);
            }
        }
        debug!(kept = detections.len(), min_confidence = self.min_confidence, "Detector finished");
        Ok(detections)
    }
}

/// Removes the staged image when dropped.
struct StagedImage(PathBuf);

impl Drop for StagedImage {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            debug!("Could not remove {}: {}", self.0.display(), e);
        }
    }
}
