//! Source image data types

/// VOI window as stored in the source (center/width in rescaled units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    pub center: f64,
    pub width: f64,
}

impl WindowParams {
    pub fn new(center: f64, width: f64) -> Self {
        Self { center, width }
    }

    pub fn min(&self) -> f64 {
        self.center - self.width / 2.0
    }

    pub fn max(&self) -> f64 {
        self.center + self.width / 2.0
    }
}

/// Decoded single-frame grayscale pixels
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Number of pixel rows (image height)
    pub rows: usize,
    /// Number of pixel columns (image width)
    pub cols: usize,
    /// Stored pixel values, row-major, sign already applied
    pub pixels: Vec<i32>,
    /// VOI window from the source, if it carries one
    pub window: Option<WindowParams>,
    /// Modality rescale slope (defaults to 1)
    pub rescale_slope: f64,
    /// Modality rescale intercept (defaults to 0)
    pub rescale_intercept: f64,
}

impl RawImage {
    pub fn new(rows: usize, cols: usize, pixels: Vec<i32>) -> Self {
        Self {
            rows,
            cols,
            pixels,
            window: None,
            rescale_slope: 1.0,
            rescale_intercept: 0.0,
        }
    }

    pub fn with_window(mut self, center: f64, width: f64) -> Self {
        self.window = Some(WindowParams::new(center, width));
        self
    }

    pub fn with_rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.rescale_slope = slope;
        self.rescale_intercept = intercept;
        self
    }

    pub fn width(&self) -> usize {
        self.cols
    }

    pub fn height(&self) -> usize {
        self.rows
    }
}

/// Identity attributes of the source image, copied verbatim into the
/// presentation state. Absent attributes stay `None`; the presentation
/// builder decides which ones are required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub patient_age: Option<String>,
    pub patient_sex: Option<String>,
    pub study_date: Option<String>,
    pub study_time: Option<String>,
    pub accession_number: Option<String>,
    pub study_description: Option<String>,
    pub study_instance_uid: Option<String>,
    pub study_id: Option<String>,
    pub series_instance_uid: Option<String>,
    pub series_number: Option<i64>,
    pub instance_number: Option<i64>,
    pub sop_class_uid: Option<String>,
    pub sop_instance_uid: Option<String>,
    pub rows: Option<u16>,
    pub columns: Option<u16>,
}

/// Everything one unit of work needs from its input file
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub raw: RawImage,
    pub metadata: SourceMetadata,
}
