use serde::{Deserialize, Serialize};

/// Colour channels written to `size/depth`.
pub const IMAGE_DEPTH: u32 = 3;

// Width of the zero-padded image id used in COCO file names
pub const FILE_ID_WIDTH: usize = 12;

/// A COCO bounding box in `[x, y, width, height]` form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

impl From<[f64; 4]> for BBox {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<BBox> for [f64; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.x, bbox.y, bbox.w, bbox.h]
    }
}

/// One raw instance detection before it is organised into a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub image_id: u64,
    pub category_id: u32,
    pub bbox: BBox,
}

impl DetectionRecord {
    pub fn new(image_id: u64, category_id: u32, bbox: BBox) -> Self {
        Self {
            image_id,
            category_id,
            bbox,
        }
    }
}

/// A labelled box in corner form, as stored in a VOC `<object>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub class_name: String,
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BoundingBox {
    pub fn new(class_name: impl Into<String>, xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self {
            class_name: class_name.into(),
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// All detections of a single image, ready to be written as VOC XML.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDocument {
    pub image_id: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub boxes: Vec<BoundingBox>,
}

impl AnnotationDocument {
    /// Name of the XML file this document is stored under.
    pub fn xml_name(&self) -> String {
        xml_file_name(self.image_id)
    }
}

/// Zero-padded image file name, e.g. `000000000042.jpg`.
pub fn image_file_name(image_id: u64) -> String {
    format!("{:0width$}.jpg", image_id, width = FILE_ID_WIDTH)
}

/// Zero-padded annotation file name, e.g. `000000000042.xml`.
pub fn xml_file_name(image_id: u64) -> String {
    format!("{:0width$}.xml", image_id, width = FILE_ID_WIDTH)
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_groups: usize,
    pub written_documents: usize,
    pub unidentified_boxes: usize,
    pub failed_documents: usize,
    pub removed_unidentified: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Image groups read: {}", self.total_groups);
        log::info!("Annotation files written: {}", self.written_documents);
        log::info!("Unidentified boxes emitted: {}", self.unidentified_boxes);
        log::info!(
            "Unidentified boxes removed by post-processing: {}",
            self.removed_unidentified
        );
        if self.failed_documents > 0 {
            log::warn!("Failed documents: {}", self.failed_documents);
        } else {
            log::info!("Failed documents: 0");
        }
    }
}
