//! Pipeline configuration types
//!
//! Loaded from a TOML file or assembled with [`PipelineConfig::builder`], then
//! handed by reference to each component constructor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::resample::BitDepth;

/// Longest AE title the upper layer protocol can carry.
const MAX_AE_TITLE_LEN: usize = 16;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub resample: ResampleConfig,
    pub detector: DetectorConfig,
    pub archive: ArchiveConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Geometry of the image handed to the detector
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Detector input width in pixels
    pub detector_width: usize,
    /// Detector input height in pixels
    pub detector_height: usize,
    /// Bit depth of the detector input (8 or 16)
    pub bit_depth: BitDepth,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            detector_width: 1024,
            detector_height: 512,
            bit_depth: BitDepth::Eight,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// External model runner: program followed by its arguments. The staged
    /// image path is appended as the last argument.
    pub command: Vec<String>,
    /// Detections below this confidence are dropped
    pub min_confidence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            min_confidence: 0.5,
        }
    }
}

/// Remote archive the presentation states are stored to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub local_ae_title: String,
    pub remote_ae_title: String,
    /// Bound on connect, and on every read and write of the exchange
    pub timeout_secs: u64,
    /// Largest PDU we are willing to receive
    pub max_pdu_length: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 104,
            local_ae_title: "GSPS_ANNOTATOR".to_string(),
            remote_ae_title: "ANY-SCP".to_string(),
            timeout_secs: 30,
            max_pdu_length: 16384,
        }
    }
}

impl ArchiveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn peer(&self) -> String {
        format!("{}@{}:{}", self.remote_ae_title, self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub staging_dir: PathBuf,
    /// When set, both encoded presentation states are kept here
    pub output_dir: Option<PathBuf>,
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            staging_dir: PathBuf::from("tmp"),
            output_dir: None,
            workers: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
    pub debug_mode: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            debug_mode: false,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| PipelineError::ConfigError(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resample.detector_width == 0 || self.resample.detector_height == 0 {
            return Err(PipelineError::InvalidDimensions(
                self.resample.detector_width,
                self.resample.detector_height,
            ));
        }

        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            return Err(PipelineError::ConfigError(format!(
                "min_confidence must lie in [0, 1], got {}",
                self.detector.min_confidence
            )));
        }

        for (name, title) in [
            ("local_ae_title", &self.archive.local_ae_title),
            ("remote_ae_title", &self.archive.remote_ae_title),
        ] {
            let trimmed = title.trim();
            if trimmed.is_empty() || trimmed.len() > MAX_AE_TITLE_LEN || !trimmed.is_ascii() {
                return Err(PipelineError::ConfigError(format!(
                    "{} must be 1-{} ASCII characters, got {:?}",
                    name, MAX_AE_TITLE_LEN, title
                )));
            }
        }

        if self.archive.timeout_secs == 0 {
            return Err(PipelineError::ConfigError(
                "archive timeout must be at least one second".to_string(),
            ));
        }

        if self.batch.workers == 0 {
            return Err(PipelineError::ConfigError(
                "at least one worker is required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    detector_size: Option<(usize, usize)>,
    bit_depth: Option<BitDepth>,
    detector_command: Option<Vec<String>>,
    min_confidence: Option<f64>,
    archive_enabled: Option<bool>,
    archive_address: Option<(String, u16)>,
    ae_titles: Option<(String, String)>,
    timeout_secs: Option<u64>,
    input_dir: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    output_dir: Option<Option<PathBuf>>,
    workers: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn detector_size(mut self, width: usize, height: usize) -> Self {
        self.detector_size = Some((width, height));
        self
    }

    pub fn bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = Some(bit_depth);
        self
    }

    pub fn detector_command(mut self, command: Vec<String>) -> Self {
        self.detector_command = Some(command);
        self
    }

    pub fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn archive_enabled(mut self, enabled: bool) -> Self {
        self.archive_enabled = Some(enabled);
        self
    }

    pub fn archive_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.archive_address = Some((host.into(), port));
        self
    }

    pub fn ae_titles(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.ae_titles = Some((local.into(), remote.into()));
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some((width, height)) = self.detector_size {
            config.resample.detector_width = width;
            config.resample.detector_height = height;
        }
        if let Some(bit_depth) = self.bit_depth {
            config.resample.bit_depth = bit_depth;
        }
        if let Some(command) = self.detector_command {
            config.detector.command = command;
        }
        if let Some(min_confidence) = self.min_confidence {
            config.detector.min_confidence = min_confidence;
        }
        if let Some(enabled) = self.archive_enabled {
            config.archive.enabled = enabled;
        }
        if let Some((host, port)) = self.archive_address {
            config.archive.host = host;
            config.archive.port = port;
        }
        if let Some((local, remote)) = self.ae_titles {
            config.archive.local_ae_title = local;
            config.archive.remote_ae_title = remote;
        }
        if let Some(secs) = self.timeout_secs {
            config.archive.timeout_secs = secs;
        }
        if let Some(dir) = self.input_dir {
            config.batch.input_dir = dir;
        }
        if let Some(dir) = self.staging_dir {
            config.batch.staging_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.batch.output_dir = dir;
        }
        if let Some(workers) = self.workers {
            config.batch.workers = workers;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder()
            .detector_size(800, 400)
            .bit_depth(BitDepth::Sixteen)
            .min_confidence(0.3)
            .archive_address("10.0.0.5", 11112)
            .ae_titles("LOCAL", "PACS")
            .workers(4)
            .build();

        assert_eq!(config.resample.detector_width, 800);
        assert_eq!(config.resample.detector_height, 400);
        assert_eq!(config.resample.bit_depth, BitDepth::Sixteen);
        assert_eq!(config.detector.min_confidence, 0.3);
        assert_eq!(config.archive.host, "10.0.0.5");
        assert_eq!(config.archive.port, 11112);
        assert_eq!(config.archive.peer(), "PACS@10.0.0.5:11112");
        assert_eq!(config.batch.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_keeps_defaults() {
        let config = PipelineConfig::builder().build();
        assert_eq!(config.resample.detector_width, 1024);
        assert_eq!(config.resample.detector_height, 512);
        assert_eq!(config.archive.timeout(), Duration::from_secs(30));
        assert!(config.batch.output_dir.is_none());
    }

    #[test]
    fn test_from_toml_partial_sections() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [resample]
            detector_width = 640
            detector_height = 320
            bit_depth = 16

            [detector]
            command = ["python3", "predict.py"]
            min_confidence = 0.25

            [archive]
            host = "pacs.local"
            port = 4242
            remote_ae_title = "ORTHANC"
            "#,
        )
        .unwrap();

        assert_eq!(config.resample.detector_width, 640);
        assert_eq!(config.resample.bit_depth, BitDepth::Sixteen);
        assert_eq!(config.detector.command, vec!["python3", "predict.py"]);
        assert_eq!(config.archive.remote_ae_title, "ORTHANC");
        assert_eq!(config.archive.local_ae_title, "GSPS_ANNOTATOR");
        assert_eq!(config.batch.workers, 1);
    }

    #[test]
    fn test_rejects_unsupported_bit_depth() {
        let result = PipelineConfig::from_toml_str("[resample]\nbit_depth = 12\n");
        assert!(matches!(result, Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn test_validation_failures() {
        let zero = PipelineConfig::builder().detector_size(0, 512).build();
        assert!(matches!(
            zero.validate(),
            Err(PipelineError::InvalidDimensions(0, 512))
        ));

        let long_title = PipelineConfig::builder()
            .ae_titles("THIS_TITLE_IS_TOO_LONG", "PACS")
            .build();
        assert!(matches!(long_title.validate(), Err(PipelineError::ConfigError(_))));

        let no_workers = PipelineConfig::builder().workers(0).build();
        assert!(matches!(no_workers.validate(), Err(PipelineError::ConfigError(_))));
    }
}
