use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, info_span, instrument, warn};

use crate::image_pipeline::{
    batch::report::{BatchReport, UnitOutcome},
    batch::staging::{promote_all, StagingDir},
    common::error::{PipelineError, Result, Stage, UnitAborted},
    config::PipelineConfig,
    detector::{CommandDetector, Detector},
    dicom::TransferSyntax,
    geometry::{map_back, MappedRegion},
    presentation::{PresentationBuilder, PresentationRecord},
    raw::{DicomFileReader, SourceImageReader},
    resample::Resampler,
    transmit::{ArchiveTransmitter, DicomTransmitter},
};

const OUTPUT_SYNTAX: TransferSyntax = TransferSyntax::ExplicitVrLittleEndian;

/// Drives each input through read, resample, detect, map back, build,
/// write and transmit. A failing unit is logged and abandoned, leaving
/// nothing in the output directory; the batch carries on with the next one.
pub struct AnnotationPipeline<R: SourceImageReader, D: Detector, T: ArchiveTransmitter> {
    reader: R,
    detector: D,
    transmitter: T,
    resampler: Resampler,
    builder: PresentationBuilder,
    config: PipelineConfig,
}

impl AnnotationPipeline<DicomFileReader, CommandDetector, DicomTransmitter> {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let detector = CommandDetector::new(&config.detector)?;
        let transmitter = DicomTransmitter::new(&config.archive);
        Self::with_custom(DicomFileReader, detector, transmitter, config)
    }
}

impl<R: SourceImageReader, D: Detector, T: ArchiveTransmitter> AnnotationPipeline<R, D, T> {
    pub fn with_custom(reader: R, detector: D, transmitter: T, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let resampler = Resampler::new(&config.resample)?;
        Ok(Self {
            reader,
            detector,
            transmitter,
            resampler,
            builder: PresentationBuilder::new(),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes every file of the configured input directory.
    pub fn run(&self) -> Result<BatchReport> {
        self.run_directory(&self.config.batch.input_dir)
    }

    /// Processes the regular, non-hidden files of `input_dir` in name order.
    pub fn run_directory<P: AsRef<Path>>(&self, input_dir: P) -> Result<BatchReport> {
        let input_dir = input_dir.as_ref();
        let files = list_inputs(input_dir)?;
        info!("Found {} input files in {}", files.len(), input_dir.display());
        self.run_batch(&files)
    }

    /// Runs every file as an independent unit, on a bounded worker pool
    /// when more than one worker is configured.
    #[instrument(skip(self, files), fields(units = files.len(), workers = self.config.batch.workers))]
    pub fn run_batch(&self, files: &[PathBuf]) -> Result<BatchReport> {
        let finished = AtomicUsize::new(0);
        let run = |path: &PathBuf| {
            let mut outcome = self.run_file(path);
            outcome.position = finished.fetch_add(1, Ordering::SeqCst) + 1;
            outcome
        };

        let outcomes: Vec<UnitOutcome> = if self.config.batch.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.batch.workers)
                .build()
                .map_err(|e| PipelineError::ConfigError(format!("worker pool: {}", e)))?;
            pool.install(|| files.par_iter().map(run).collect())
        } else {
            files.iter().map(run).collect()
        };

        let report = BatchReport::new(outcomes);
        info!(
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            "Batch complete"
        );
        Ok(report)
    }

    pub fn run_file(&self, path: &Path) -> UnitOutcome {
        let unit = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match fs::read(path) {
            Ok(data) => self.run_unit(&unit, &data),
            Err(e) => {
                let aborted = UnitAborted::new(
                    unit.clone(),
                    Stage::ReadSource,
                    PipelineError::InputReadError(format!("{}: {}", path.display(), e)),
                );
                warn!("{}", aborted);
                let mut outcome = UnitOutcome::new(unit, 0);
                outcome.abort(&aborted);
                outcome
            }
        }
    }

    /// Runs one unit to completion or to its first failing stage.
    pub fn run_unit(&self, unit: &str, data: &[u8]) -> UnitOutcome {
        let _span = info_span!("unit", file = unit).entered();
        info!(input_size = data.len(), "Processing unit");

        let mut outcome = UnitOutcome::new(unit, data.len() as u64);
        match self.execute(unit, data, &mut outcome) {
            Ok(()) => {
                outcome.succeeded = true;
                info!(
                    detections = outcome.detections,
                    total_ms = outcome.timings.total_duration().as_secs_f64() * 1000.0,
                    "Unit complete"
                );
            }
            Err(aborted) => {
                warn!("{}", aborted);
                outcome.abort(&aborted);
            }
        }
        for line in outcome.timings.summary_lines() {
            debug!("{}", line);
        }
        outcome
    }

    fn execute(&self, unit: &str, data: &[u8], outcome: &mut UnitOutcome) -> std::result::Result<(), UnitAborted> {
        let abort = move |stage: Stage| move |source: PipelineError| UnitAborted::new(unit, stage, source);
        let timings = &mut outcome.timings;

        let source = {
            let _span = info_span!("read_source").entered();
            timings.measure(Stage::ReadSource.as_str(), || self.reader.read_source(data))
        }
        .map_err(abort(Stage::ReadSource))?;
        let raw = &source.raw;

        let (canonical, transform) = {
            let _span = info_span!("resample", rows = raw.rows, cols = raw.cols).entered();
            timings.measure(Stage::Resample.as_str(), || self.resampler.resample(raw))
        }
        .map_err(abort(Stage::Resample))?;

        let stem = unit_stem(unit);
        let staging = StagingDir::create(&self.config.batch.staging_dir, &stem).map_err(abort(Stage::Detect))?;

        let detections = {
            let _span = info_span!("detect", width = canonical.width, height = canonical.height).entered();
            timings.measure(Stage::Detect.as_str(), || self.detector.predict(&canonical, staging.path()))
        }
        .map_err(abort(Stage::Detect))?;
        outcome.detections = detections.len();
        if detections.is_empty() {
            info!("No detections");
        } else {
            info!("Detector returned {} regions", detections.len());
        }

        let regions: Vec<MappedRegion> = {
            let _span = info_span!("map_back").entered();
            timings.measure(Stage::MapBack.as_str(), || {
                detections
                    .iter()
                    .map(|detection| map_back(detection, &transform, raw.cols, raw.rows))
                    .collect()
            })
        };

        let records = {
            let _span = info_span!("build_presentation", regions = regions.len()).entered();
            timings.measure(Stage::BuildPresentation.as_str(), || -> Result<[PresentationRecord; 2]> {
                Ok([
                    self.builder.build(&source.metadata, &regions, true)?,
                    self.builder.build(&source.metadata, &regions, false)?,
                ])
            })
        }
        .map_err(abort(Stage::BuildPresentation))?;

        let staged = {
            let _span = info_span!("write_output").entered();
            timings.measure(Stage::WriteOutput.as_str(), || self.stage_outputs(&staging, &stem, &records))
        }
        .map_err(abort(Stage::WriteOutput))?;

        if self.config.archive.enabled {
            let _span = info_span!("transmit", peer = %self.config.archive.peer()).entered();
            for record in &records {
                let sent = timings.measure(Stage::Transmit.as_str(), || self.transmitter.send(record));
                outcome.transmissions.push(sent);
            }
        } else {
            debug!("Archive disabled, nothing sent");
        }

        let failures: Vec<&str> = outcome
            .transmissions
            .iter()
            .filter(|sent| !sent.succeeded)
            .map(|sent| sent.detail.as_str())
            .collect();
        if !failures.is_empty() {
            return Err(abort(Stage::Transmit)(PipelineError::TransferFailed(failures.join("; "))));
        }

        // records leave staging only once nothing else can fail the unit
        outcome.outputs = match &self.config.batch.output_dir {
            Some(dir) => {
                let _span = info_span!("publish_output", dir = %dir.display()).entered();
                timings.measure(Stage::WriteOutput.as_str(), || promote_all(&staged, dir))
            }
            None => Ok(Vec::new()),
        }
        .map_err(abort(Stage::WriteOutput))?;
        drop(staging);
        Ok(())
    }

    /// Encodes both records into the unit's staging directory.
    fn stage_outputs(&self, staging: &StagingDir, stem: &str, records: &[PresentationRecord]) -> Result<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(records.len());
        for record in records {
            let suffix = if record.shows_confidence() { "confidence" } else { "no_confidence" };
            let bytes = record.to_part10(OUTPUT_SYNTAX)?;
            staged.push(staging.write(&format!("{}_{}.dcm", stem, suffix), &bytes)?);
        }
        Ok(staged)
    }
}

fn unit_stem(unit: &str) -> String {
    Path::new(unit)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| unit.to_string())
}

fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| PipelineError::InputReadError(format!("{}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let path = entry.path();
        if path.is_file() && !hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
