//! COCO format data structures and loaders
//!
//! Only the parts of a COCO instances file needed to build VOC documents are
//! modelled: the image table (for sizes), the category table (for logging) and
//! the annotation records themselves.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{BBox, DetectionRecord};

/// COCO category information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub supercategory: String,
}

/// COCO image information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    #[serde(default)]
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// COCO annotation information.
///
/// `category_id` and `bbox` are optional here so that a record missing them
/// fails only the document it belongs to instead of the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: Option<u64>,
    pub image_id: u64,
    #[serde(default)]
    pub category_id: Option<u32>,
    #[serde(default)]
    pub bbox: Option<BBox>, // [x, y, width, height]
    #[serde(default)]
    pub iscrowd: u32,
}

impl Annotation {
    pub fn new(image_id: u64, category_id: u32, bbox: BBox) -> Self {
        Self {
            id: None,
            image_id,
            category_id: Some(category_id),
            bbox: Some(bbox),
            iscrowd: 0,
        }
    }
}

impl TryFrom<&Annotation> for DetectionRecord {
    type Error = Error;

    fn try_from(annotation: &Annotation) -> Result<Self> {
        let image_id = annotation.image_id;
        let category_id = annotation
            .category_id
            .ok_or_else(|| Error::malformed(image_id, "missing category_id"))?;
        let bbox = annotation
            .bbox
            .ok_or_else(|| Error::malformed(image_id, "missing bbox"))?;
        Ok(DetectionRecord::new(image_id, category_id, bbox))
    }
}

/// Complete COCO instances file. `info` and `licenses` are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoFile {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
}

/// Image header of a per-image annotation file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// A JSON file holding the detections of a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnnotationFile {
    pub image: ImageInfo,
    #[serde(default)]
    pub annotation: Vec<Annotation>,
}

/// A loaded COCO instances file, handed to the converter as its record source.
#[derive(Debug, Clone, Default)]
pub struct CocoIndex {
    annotations: Vec<Annotation>,
    image_sizes: HashMap<u64, (u32, u32)>,
    categories: Vec<Category>,
}

impl CocoIndex {
    /// Parse a COCO instances file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let coco: CocoFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let index = Self::from_coco_file(coco);
        info!(
            "Loaded {} annotations for {} images from {}",
            index.annotations.len(),
            index.image_sizes.len(),
            path.display()
        );
        Ok(index)
    }

    pub fn from_coco_file(coco: CocoFile) -> Self {
        let image_sizes = coco
            .images
            .iter()
            .map(|image| (image.id, (image.width, image.height)))
            .collect();
        for category in &coco.categories {
            debug!("Available category: {} {}", category.id, category.name);
        }
        Self {
            annotations: coco.annotations,
            image_sizes,
            categories: coco.categories,
        }
    }

    /// Annotation records in file order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// `(width, height)` of an image listed in the file.
    pub fn image_size(&self, image_id: u64) -> Option<(u32, u32)> {
        self.image_sizes.get(&image_id).copied()
    }
}
