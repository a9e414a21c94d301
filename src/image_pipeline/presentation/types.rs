//! Presentation record types

use chrono::NaiveDateTime;

use crate::image_pipeline::raw::types::SourceMetadata;

/// Confidence band that selects the outline colour family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    /// confidence > 0.8
    Green,
    /// 0.65 < confidence <= 0.8
    Yellow,
    /// confidence <= 0.65
    Red,
}

impl ConfidenceTier {
    pub fn classify(confidence: f64) -> Self {
        if confidence > 0.8 {
            ConfidenceTier::Green
        } else if confidence > 0.65 {
            ConfidenceTier::Yellow
        } else {
            ConfidenceTier::Red
        }
    }
}

/// PatternOnColorCIELabValue triple, 16 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CieLabColor(pub [u16; 3]);

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    /// Anchor point in source pixel coordinates
    pub anchor: (f64, f64),
}

/// One outlined region of the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Closed outline, first point repeated last
    pub polygon: [(f64, f64); 5],
    pub confidence: f64,
    pub tier: ConfidenceTier,
    pub color: CieLabColor,
    pub label: Option<TextLabel>,
}

/// A presentation state ready for encoding and transmission.
///
/// Built by [`PresentationBuilder`](super::PresentationBuilder); read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct PresentationRecord {
    pub(super) source: SourceMetadata,
    pub(super) series_instance_uid: String,
    pub(super) sop_instance_uid: String,
    pub(super) series_number: i64,
    pub(super) instance_number: i64,
    pub(super) content_creator: String,
    pub(super) created: NaiveDateTime,
    pub(super) annotations: Vec<Annotation>,
    pub(super) shows_confidence: bool,
}

impl PresentationRecord {
    /// Identity attributes copied from the referenced image
    pub fn source(&self) -> &SourceMetadata {
        &self.source
    }

    pub fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    pub fn sop_instance_uid(&self) -> &str {
        &self.sop_instance_uid
    }

    pub fn series_number(&self) -> i64 {
        self.series_number
    }

    pub fn instance_number(&self) -> i64 {
        self.instance_number
    }

    pub fn created(&self) -> NaiveDateTime {
        self.created
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn shows_confidence(&self) -> bool {
        self.shows_confidence
    }
}
