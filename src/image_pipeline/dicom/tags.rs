//! Tags used by the pipeline, and their VRs for implicit-VR decoding.

use super::element::{Tag, Vr};

// Command group
pub const COMMAND_GROUP_LENGTH: Tag = Tag(0x0000, 0x0000);
pub const AFFECTED_SOP_CLASS_UID: Tag = Tag(0x0000, 0x0002);
pub const COMMAND_FIELD: Tag = Tag(0x0000, 0x0100);
pub const MESSAGE_ID: Tag = Tag(0x0000, 0x0110);
pub const MESSAGE_ID_BEING_RESPONDED_TO: Tag = Tag(0x0000, 0x0120);
pub const PRIORITY: Tag = Tag(0x0000, 0x0700);
pub const COMMAND_DATA_SET_TYPE: Tag = Tag(0x0000, 0x0800);
pub const STATUS: Tag = Tag(0x0000, 0x0900);
pub const ERROR_COMMENT: Tag = Tag(0x0000, 0x0902);
pub const AFFECTED_SOP_INSTANCE_UID: Tag = Tag(0x0000, 0x1000);

// File meta information
pub const FILE_META_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
pub const FILE_META_VERSION: Tag = Tag(0x0002, 0x0001);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);

// SOP common, study, series
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
pub const REFERENCED_IMAGE_SEQUENCE: Tag = Tag(0x0008, 0x1140);
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);

// Patient
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);

pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);

// Image pixel and VOI LUT
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);

// Presentation state
pub const GRAPHIC_ANNOTATION_SEQUENCE: Tag = Tag(0x0070, 0x0001);
pub const GRAPHIC_LAYER: Tag = Tag(0x0070, 0x0002);
pub const ANCHOR_POINT_ANNOTATION_UNITS: Tag = Tag(0x0070, 0x0004);
pub const GRAPHIC_ANNOTATION_UNITS: Tag = Tag(0x0070, 0x0005);
pub const UNFORMATTED_TEXT_VALUE: Tag = Tag(0x0070, 0x0006);
pub const TEXT_OBJECT_SEQUENCE: Tag = Tag(0x0070, 0x0008);
pub const GRAPHIC_OBJECT_SEQUENCE: Tag = Tag(0x0070, 0x0009);
pub const ANCHOR_POINT: Tag = Tag(0x0070, 0x0014);
pub const ANCHOR_POINT_VISIBILITY: Tag = Tag(0x0070, 0x0015);
pub const GRAPHIC_DIMENSIONS: Tag = Tag(0x0070, 0x0020);
pub const NUMBER_OF_GRAPHIC_POINTS: Tag = Tag(0x0070, 0x0021);
pub const GRAPHIC_DATA: Tag = Tag(0x0070, 0x0022);
pub const GRAPHIC_TYPE: Tag = Tag(0x0070, 0x0023);
pub const GRAPHIC_FILLED: Tag = Tag(0x0070, 0x0024);
pub const DISPLAYED_AREA_TOP_LEFT_HAND_CORNER: Tag = Tag(0x0070, 0x0052);
pub const DISPLAYED_AREA_BOTTOM_RIGHT_HAND_CORNER: Tag = Tag(0x0070, 0x0053);
pub const DISPLAYED_AREA_SELECTION_SEQUENCE: Tag = Tag(0x0070, 0x005A);
pub const GRAPHIC_LAYER_SEQUENCE: Tag = Tag(0x0070, 0x0060);
pub const GRAPHIC_LAYER_ORDER: Tag = Tag(0x0070, 0x0062);
pub const CONTENT_LABEL: Tag = Tag(0x0070, 0x0080);
pub const CONTENT_DESCRIPTION: Tag = Tag(0x0070, 0x0081);
pub const PRESENTATION_CREATION_DATE: Tag = Tag(0x0070, 0x0082);
pub const PRESENTATION_CREATION_TIME: Tag = Tag(0x0070, 0x0083);
pub const CONTENT_CREATOR_NAME: Tag = Tag(0x0070, 0x0084);
pub const PRESENTATION_SIZE_MODE: Tag = Tag(0x0070, 0x0100);
pub const PRESENTATION_PIXEL_ASPECT_RATIO: Tag = Tag(0x0070, 0x0102);
pub const LINE_STYLE_SEQUENCE: Tag = Tag(0x0070, 0x0232);
pub const SHADOW_STYLE: Tag = Tag(0x0070, 0x0244);
pub const SHADOW_OFFSET_X: Tag = Tag(0x0070, 0x0245);
pub const SHADOW_OFFSET_Y: Tag = Tag(0x0070, 0x0246);
pub const PATTERN_ON_COLOR_CIELAB_VALUE: Tag = Tag(0x0070, 0x0251);
pub const LINE_THICKNESS: Tag = Tag(0x0070, 0x0253);
pub const LINE_DASHING_STYLE: Tag = Tag(0x0070, 0x0254);
pub const SHADOW_OPACITY: Tag = Tag(0x0070, 0x0258);
pub const PATTERN_ON_OPACITY: Tag = Tag(0x0070, 0x0284);
pub const PRESENTATION_LUT_SHAPE: Tag = Tag(0x2050, 0x0020);

pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// Delimiters carry no VR in either syntax
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
pub const ITEM_DELIMITATION: Tag = Tag(0xFFFE, 0xE00D);
pub const SEQUENCE_DELIMITATION: Tag = Tag(0xFFFE, 0xE0DD);

/// VR of a tag when the stream does not carry it. Unknown tags come back as UN
/// and are kept as raw bytes.
pub fn implicit_vr(tag: Tag) -> Vr {
    if tag.element() == 0x0000 {
        return Vr::UL;
    }
    match tag {
        AFFECTED_SOP_CLASS_UID | AFFECTED_SOP_INSTANCE_UID => Vr::UI,
        COMMAND_FIELD | MESSAGE_ID | MESSAGE_ID_BEING_RESPONDED_TO | PRIORITY
        | COMMAND_DATA_SET_TYPE | STATUS => Vr::US,
        ERROR_COMMENT => Vr::LO,
        SOP_CLASS_UID | SOP_INSTANCE_UID | STUDY_INSTANCE_UID | SERIES_INSTANCE_UID
        | REFERENCED_SOP_CLASS_UID | REFERENCED_SOP_INSTANCE_UID | TRANSFER_SYNTAX_UID
        | MEDIA_STORAGE_SOP_CLASS_UID | MEDIA_STORAGE_SOP_INSTANCE_UID => Vr::UI,
        STUDY_DATE | SERIES_DATE | INSTANCE_CREATION_DATE | PRESENTATION_CREATION_DATE => Vr::DA,
        STUDY_TIME | SERIES_TIME | INSTANCE_CREATION_TIME | PRESENTATION_CREATION_TIME => Vr::TM,
        ACCESSION_NUMBER | STUDY_ID => Vr::SH,
        MODALITY | PATIENT_SEX | CONTENT_LABEL | GRAPHIC_LAYER => Vr::CS,
        STUDY_DESCRIPTION | PATIENT_ID | CONTENT_DESCRIPTION => Vr::LO,
        PATIENT_NAME | CONTENT_CREATOR_NAME => Vr::PN,
        PATIENT_AGE => Vr::AS,
        SERIES_NUMBER | INSTANCE_NUMBER => Vr::IS,
        SAMPLES_PER_PIXEL | ROWS | COLUMNS | BITS_ALLOCATED | BITS_STORED
        | PIXEL_REPRESENTATION => Vr::US,
        WINDOW_CENTER | WINDOW_WIDTH | RESCALE_INTERCEPT | RESCALE_SLOPE => Vr::DS,
        REFERENCED_SERIES_SEQUENCE | REFERENCED_IMAGE_SEQUENCE | GRAPHIC_ANNOTATION_SEQUENCE
        | TEXT_OBJECT_SEQUENCE | GRAPHIC_OBJECT_SEQUENCE | DISPLAYED_AREA_SELECTION_SEQUENCE
        | GRAPHIC_LAYER_SEQUENCE | LINE_STYLE_SEQUENCE => Vr::SQ,
        PIXEL_DATA => Vr::OW,
        _ => Vr::UN,
    }
}
