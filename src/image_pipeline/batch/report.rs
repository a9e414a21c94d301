use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::image_pipeline::common::error::{PipelineError, Result, Stage, UnitAborted};
use crate::image_pipeline::common::timing::PipelineTimings;
use crate::image_pipeline::transmit::TransmissionOutcome;

const STAGES: [Stage; 7] = [
    Stage::ReadSource,
    Stage::Resample,
    Stage::Detect,
    Stage::MapBack,
    Stage::BuildPresentation,
    Stage::WriteOutput,
    Stage::Transmit,
];

/// Result of one unit of work
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    /// Input file name
    pub unit: String,
    pub succeeded: bool,
    /// Detections kept after the confidence threshold
    pub detections: usize,
    /// Input file size in bytes
    pub input_size: u64,
    /// 1-based order in which the unit finished
    pub position: usize,
    pub timings: PipelineTimings,
    /// One entry per record sent, empty when sending is disabled
    pub transmissions: Vec<TransmissionOutcome>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
    /// Presentation states kept in the output directory
    pub outputs: Vec<PathBuf>,
}

impl UnitOutcome {
    pub fn new(unit: impl Into<String>, input_size: u64) -> Self {
        Self {
            unit: unit.into(),
            succeeded: false,
            detections: 0,
            input_size,
            position: 0,
            timings: PipelineTimings::new(),
            transmissions: Vec::new(),
            failed_stage: None,
            error: None,
            outputs: Vec::new(),
        }
    }

    pub fn abort(&mut self, aborted: &UnitAborted) {
        self.succeeded = false;
        self.failed_stage = Some(aborted.stage);
        self.error = Some(aborted.source.to_string());
    }
}

/// Outcomes of a whole batch, ordered by completion
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    outcomes: Vec<UnitOutcome>,
}

impl BatchReport {
    pub fn new(mut outcomes: Vec<UnitOutcome>) -> Self {
        outcomes.sort_by_key(|o| o.position);
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[UnitOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.succeeded_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded)
    }

    /// 0 when every unit succeeded, 2 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.all_succeeded() { 0 } else { 2 }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.outcomes.len() + 2);
        lines.push(format!(
            "{:<4} {:<32} {:>6} {:>12} {:>10}  {}",
            "#", "file", "boxes", "total_ms", "status", "detail"
        ));
        for outcome in &self.outcomes {
            let status = if outcome.succeeded { "ok" } else { "failed" };
            let detail = match (&outcome.failed_stage, &outcome.error) {
                (Some(stage), Some(error)) => format!("{}: {}", stage, error),
                (None, Some(error)) => error.clone(),
                _ => String::new(),
            };
            lines.push(format!(
                "{:<4} {:<32} {:>6} {:>12.3} {:>10}  {}",
                outcome.position,
                outcome.unit,
                outcome.detections,
                outcome.timings.total_duration().as_secs_f64() * 1000.0,
                status,
                detail
            ));
        }
        lines.push(format!(
            "{} units, {} succeeded, {} failed",
            self.len(),
            self.succeeded_count(),
            self.failed_count()
        ));
        lines
    }

    /// Writes one row per unit with per-stage durations in milliseconds.
    pub fn write_csv<W: Write>(&self, output: &mut W) -> Result<()> {
        let mut header = String::from("file,nb_bboxes,size,position,succeeded");
        for stage in STAGES {
            header.push_str(&format!(",{}_ms", stage));
        }
        writeln!(output, "{}", header)?;

        for outcome in &self.outcomes {
            let mut row = format!(
                "{},{},{},{},{}",
                csv_field(&outcome.unit),
                outcome.detections,
                outcome.input_size,
                outcome.position,
                outcome.succeeded
            );
            for stage in STAGES {
                match outcome.timings.get_step(stage.as_str()) {
                    Some(duration) => row.push_str(&format!(",{:.3}", duration.as_secs_f64() * 1000.0)),
                    None => row.push(','),
                }
            }
            writeln!(output, "{}", row)?;
        }
        Ok(())
    }

    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);
        self.write_csv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
