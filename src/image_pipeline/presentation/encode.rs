//! DICOM encoding of a presentation record (Grayscale Softcopy Presentation
//! State IOD).

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::dicom::uid::GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE;
use crate::image_pipeline::dicom::{encode_dataset, tags, write_part10, DataSet, TransferSyntax, Value, Vr};
use crate::image_pipeline::presentation::types::{Annotation, PresentationRecord, TextLabel};

const GRAPHIC_LAYER_NAME: &str = "ANALYSIS LAYER";
const CONTENT_LABEL: &str = "LESION";

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn floats(values: &[f64]) -> Value {
    Value::F32(values.iter().map(|&v| v as f32).collect())
}

impl PresentationRecord {
    pub fn sop_class_uid(&self) -> &'static str {
        GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE
    }

    /// The record as a presentation state data set.
    pub fn to_dataset(&self) -> DataSet {
        let src = &self.source;
        let date = self.created.format("%Y%m%d").to_string();
        let time = self.created.format("%H%M%S").to_string();
        let mut ds = DataSet::new();

        // Patient
        ds.put_str(tags::PATIENT_NAME, Vr::PN, opt(&src.patient_name));
        ds.put_str(tags::PATIENT_ID, Vr::LO, opt(&src.patient_id));
        ds.put_str(tags::PATIENT_AGE, Vr::AS, opt(&src.patient_age));
        ds.put_str(tags::PATIENT_SEX, Vr::CS, opt(&src.patient_sex));

        // General study
        ds.put_str(tags::STUDY_DATE, Vr::DA, opt(&src.study_date));
        ds.put_str(tags::STUDY_TIME, Vr::TM, opt(&src.study_time));
        ds.put_str(tags::ACCESSION_NUMBER, Vr::SH, opt(&src.accession_number));
        if let Some(description) = &src.study_description {
            ds.put_str(tags::STUDY_DESCRIPTION, Vr::LO, description.clone());
        }
        ds.put_str(tags::STUDY_INSTANCE_UID, Vr::UI, opt(&src.study_instance_uid));
        ds.put_str(tags::STUDY_ID, Vr::SH, opt(&src.study_id));

        // General series
        ds.put_str(tags::SERIES_DATE, Vr::DA, date.clone());
        ds.put_str(tags::SERIES_TIME, Vr::TM, time.clone());
        ds.put_str(tags::MODALITY, Vr::CS, "PR");
        ds.put_str(tags::SERIES_INSTANCE_UID, Vr::UI, self.series_instance_uid.clone());
        ds.put_str(tags::SERIES_NUMBER, Vr::IS, self.series_number.to_string());

        // Presentation state identification
        ds.put_str(tags::INSTANCE_NUMBER, Vr::IS, self.instance_number.to_string());
        ds.put_str(tags::CONTENT_LABEL, Vr::CS, CONTENT_LABEL);
        ds.put_str(tags::PRESENTATION_CREATION_DATE, Vr::DA, date.clone());
        ds.put_str(tags::PRESENTATION_CREATION_TIME, Vr::TM, time.clone());
        ds.put_str(tags::CONTENT_CREATOR_NAME, Vr::PN, self.content_creator.clone());

        // Presentation state relationship
        let mut image_ref = DataSet::new();
        image_ref.put_str(tags::REFERENCED_SOP_CLASS_UID, Vr::UI, opt(&src.sop_class_uid));
        image_ref.put_str(tags::REFERENCED_SOP_INSTANCE_UID, Vr::UI, opt(&src.sop_instance_uid));
        let mut series_ref = DataSet::new();
        series_ref.put_sequence(tags::REFERENCED_IMAGE_SEQUENCE, vec![image_ref]);
        series_ref.put_str(tags::SERIES_INSTANCE_UID, Vr::UI, opt(&src.series_instance_uid));
        ds.put_sequence(tags::REFERENCED_SERIES_SEQUENCE, vec![series_ref]);

        // Displayed area
        let columns = i32::from(src.columns.unwrap_or_default());
        let rows = i32::from(src.rows.unwrap_or_default());
        let mut area = DataSet::new();
        area.put(tags::DISPLAYED_AREA_TOP_LEFT_HAND_CORNER, Vr::SL, Value::I32(vec![0, 0]));
        area.put(
            tags::DISPLAYED_AREA_BOTTOM_RIGHT_HAND_CORNER,
            Vr::SL,
            Value::I32(vec![columns, rows]),
        );
        area.put_str(tags::PRESENTATION_SIZE_MODE, Vr::CS, "SCALE TO FIT");
        area.put(
            tags::PRESENTATION_PIXEL_ASPECT_RATIO,
            Vr::IS,
            Value::Strs(vec!["1".to_string(), "1".to_string()]),
        );
        ds.put_sequence(tags::DISPLAYED_AREA_SELECTION_SEQUENCE, vec![area]);

        // Graphic annotations
        if !self.annotations.is_empty() {
            let items = self.annotations.iter().map(annotation_item).collect();
            ds.put_sequence(tags::GRAPHIC_ANNOTATION_SEQUENCE, items);
        }

        let mut layer = DataSet::new();
        layer.put_str(tags::GRAPHIC_LAYER, Vr::CS, GRAPHIC_LAYER_NAME);
        layer.put_str(tags::GRAPHIC_LAYER_ORDER, Vr::IS, "0");
        ds.put_sequence(tags::GRAPHIC_LAYER_SEQUENCE, vec![layer]);

        ds.put_str(tags::PRESENTATION_LUT_SHAPE, Vr::CS, "IDENTITY");

        // SOP common
        ds.put_str(tags::INSTANCE_CREATION_DATE, Vr::DA, date);
        ds.put_str(tags::INSTANCE_CREATION_TIME, Vr::TM, time);
        ds.put_str(tags::SOP_CLASS_UID, Vr::UI, self.sop_class_uid());
        ds.put_str(tags::SOP_INSTANCE_UID, Vr::UI, self.sop_instance_uid.clone());

        ds
    }

    /// Data set bytes without a file preamble, as carried in a C-STORE.
    pub fn encode(&self, syntax: TransferSyntax) -> Result<Vec<u8>> {
        encode_dataset(&self.to_dataset(), syntax)
    }

    /// A complete Part 10 file.
    pub fn to_part10(&self, syntax: TransferSyntax) -> Result<Vec<u8>> {
        write_part10(&self.to_dataset(), self.sop_class_uid(), &self.sop_instance_uid, syntax)
    }
}

fn annotation_item(annotation: &Annotation) -> DataSet {
    let mut line_style = DataSet::new();
    line_style.put_str(tags::SHADOW_STYLE, Vr::CS, "OFF");
    line_style.put(tags::SHADOW_OFFSET_X, Vr::FL, floats(&[0.0]));
    line_style.put(tags::SHADOW_OFFSET_Y, Vr::FL, floats(&[0.0]));
    line_style.put(tags::LINE_THICKNESS, Vr::FL, floats(&[2.0]));
    line_style.put_str(tags::LINE_DASHING_STYLE, Vr::CS, "SOLID");
    line_style.put(tags::SHADOW_OPACITY, Vr::FL, floats(&[0.0]));
    line_style.put(tags::PATTERN_ON_OPACITY, Vr::FL, floats(&[1.0]));
    line_style.put(
        tags::PATTERN_ON_COLOR_CIELAB_VALUE,
        Vr::US,
        Value::U16(annotation.color.0.to_vec()),
    );

    let points: Vec<f64> = annotation
        .polygon
        .iter()
        .flat_map(|&(x, y)| [x, y])
        .collect();

    let mut graphic = DataSet::new();
    graphic.put_str(tags::GRAPHIC_ANNOTATION_UNITS, Vr::CS, "PIXEL");
    graphic.put_u16(tags::GRAPHIC_DIMENSIONS, 2);
    graphic.put_u16(tags::NUMBER_OF_GRAPHIC_POINTS, annotation.polygon.len() as u16);
    graphic.put(tags::GRAPHIC_DATA, Vr::FL, floats(&points));
    graphic.put_str(tags::GRAPHIC_TYPE, Vr::CS, "POLYLINE");
    graphic.put_str(tags::GRAPHIC_FILLED, Vr::CS, "N");
    graphic.put_sequence(tags::LINE_STYLE_SEQUENCE, vec![line_style]);

    let mut item = DataSet::new();
    item.put_str(tags::GRAPHIC_LAYER, Vr::CS, GRAPHIC_LAYER_NAME);
    if let Some(label) = &annotation.label {
        item.put_sequence(tags::TEXT_OBJECT_SEQUENCE, vec![text_item(label)]);
    }
    item.put_sequence(tags::GRAPHIC_OBJECT_SEQUENCE, vec![graphic]);
    item
}

fn text_item(label: &TextLabel) -> DataSet {
    let mut text = DataSet::new();
    text.put_str(tags::ANCHOR_POINT_ANNOTATION_UNITS, Vr::CS, "PIXEL");
    text.put_str(tags::UNFORMATTED_TEXT_VALUE, Vr::ST, label.text.clone());
    text.put(tags::ANCHOR_POINT, Vr::FL, floats(&[label.anchor.0, label.anchor.1]));
    text.put_str(tags::ANCHOR_POINT_VISIBILITY, Vr::CS, "N");
    text
}
