use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::dicom::generate_uid;
use crate::image_pipeline::geometry::MappedRegion;
use crate::image_pipeline::presentation::color::tier_color;
use crate::image_pipeline::presentation::types::{Annotation, PresentationRecord, TextLabel};
use crate::image_pipeline::raw::types::SourceMetadata;

/// Vertical distance between a region's top edge and its label anchor
const LABEL_OFFSET: f64 = 30.0;

const DEFAULT_CONTENT_CREATOR: &str = "GSPS^ANNOTATOR";

#[derive(Debug, Clone)]
pub struct PresentationBuilder {
    content_creator: String,
}

impl Default for PresentationBuilder {
    fn default() -> Self {
        Self {
            content_creator: DEFAULT_CONTENT_CREATOR.to_string(),
        }
    }
}

impl PresentationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_creator(mut self, name: impl Into<String>) -> Self {
        self.content_creator = name.into();
        self
    }

    /// Builds a record timestamped with the local clock.
    pub fn build(
        &self,
        source: &SourceMetadata,
        regions: &[MappedRegion],
        show_confidence_text: bool,
    ) -> Result<PresentationRecord> {
        self.build_at(source, regions, show_confidence_text, Local::now().naive_local())
    }

    /// Builds a record with one annotation per region, in input order.
    ///
    /// Fails with `IncompleteSourceMetadata` naming the first missing
    /// attribute the record must reference.
    pub fn build_at(
        &self,
        source: &SourceMetadata,
        regions: &[MappedRegion],
        show_confidence_text: bool,
        created: NaiveDateTime,
    ) -> Result<PresentationRecord> {
        check_required(source)?;

        let series_number = source
            .series_number
            .ok_or(PipelineError::IncompleteSourceMetadata("SeriesNumber"))?;
        let instance_number = source
            .instance_number
            .ok_or(PipelineError::IncompleteSourceMetadata("InstanceNumber"))?;

        let annotations: Vec<Annotation> = regions
            .iter()
            .map(|region| annotate(region, show_confidence_text))
            .collect();

        debug!(
            annotations = annotations.len(),
            show_confidence_text, "Built presentation record"
        );

        Ok(PresentationRecord {
            source: source.clone(),
            series_instance_uid: generate_uid(),
            sop_instance_uid: generate_uid(),
            series_number: series_number + 1,
            instance_number: instance_number + 1,
            content_creator: self.content_creator.clone(),
            created,
            annotations,
            shows_confidence: show_confidence_text,
        })
    }
}

fn check_required(source: &SourceMetadata) -> Result<()> {
    let text_fields = [
        ("PatientName", &source.patient_name),
        ("PatientID", &source.patient_id),
        ("StudyInstanceUID", &source.study_instance_uid),
        ("SeriesInstanceUID", &source.series_instance_uid),
        ("SOPClassUID", &source.sop_class_uid),
        ("SOPInstanceUID", &source.sop_instance_uid),
    ];
    for (name, value) in text_fields {
        if value.as_deref().is_none_or(str::is_empty) {
            return Err(PipelineError::IncompleteSourceMetadata(name));
        }
    }
    if source.rows.is_none() {
        return Err(PipelineError::IncompleteSourceMetadata("Rows"));
    }
    if source.columns.is_none() {
        return Err(PipelineError::IncompleteSourceMetadata("Columns"));
    }
    Ok(())
}

fn annotate(region: &MappedRegion, show_confidence_text: bool) -> Annotation {
    let (tier, color) = tier_color(region.confidence);
    let label = show_confidence_text.then(|| TextLabel {
        text: format!("Confidence: {}%", (region.confidence * 100.0).round() as i64),
        anchor: (region.x, region.y - LABEL_OFFSET),
    });
    Annotation {
        polygon: region.polygon(),
        confidence: region.confidence,
        tier,
        color,
        label,
    }
}
