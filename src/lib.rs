//! COCO to PASCAL VOC annotation converter
//!
//! This library groups flat COCO detection records by image, writes one PASCAL
//! VOC XML file per image and provides clean-up and inspection passes over the
//! resulting label directories.

pub mod category;
pub mod coco;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod grouping;
pub mod inspect;
pub mod io;
pub mod postprocess;
pub mod types;
pub mod utils;
pub mod voc;

// Re-export commonly used types and functions
pub use category::{CategoryMap, UNIDENTIFIED};
pub use coco::CocoIndex;
pub use config::{Args, Command, ConvertOptions};
pub use conversion::build_document;
pub use dataset::{convert_coco_index, process_coco_dataset, process_json_dir};
pub use error::{Error, Result};
pub use grouping::group_by_image;
pub use inspect::{inspect_dataset, DatasetStats};
pub use io::AnnotationStore;
pub use postprocess::{filter_classes, post_process, post_process_all, FilterReport};
pub use types::{AnnotationDocument, BBox, BoundingBox, DetectionRecord, ProcessingStats};
pub use voc::{parse, serialize, VocAnnotation};
