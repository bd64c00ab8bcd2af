//! Dataset statistics over a directory of images and VOC label files.

use log::info;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::AnnotationStore;
use crate::utils::count_files;

/// Class list reported when the caller does not give one.
pub const DEFAULT_CLASSES: &[&str] = &[
    "person",
    "car",
    "bus",
    "bicycle",
    "motorcycle",
    "bench",
    "chair",
    "bin",
    "trafficlight_red",
    "trafficlight_green",
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatasetStats {
    pub image_count: usize,
    pub label_count: usize,
    /// Instance counts: listed classes first in list order, then any other
    /// class found in the labels, sorted by name.
    pub instances: Vec<(String, usize)>,
}

impl DatasetStats {
    pub fn instances_of(&self, class_name: &str) -> usize {
        self.instances
            .iter()
            .find(|(name, _)| name == class_name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn print_summary(&self, listed_classes: usize) {
        info!("---------------");
        info!("DATASET INFORMATION:");
        info!("Images count: {}", self.image_count);
        info!("Labels count: {}", self.label_count);
        info!("Number of classes: {}", listed_classes);
        for (index, (name, count)) in self.instances.iter().enumerate() {
            info!("Instance no. for class #{}: {} ({})", index, count, name);
        }
        info!("---------------");
    }
}

/// Count images, label files and object instances per class.
pub fn inspect_dataset(
    image_dir: &Path,
    label_dir: &Path,
    classes: &[String],
) -> Result<DatasetStats> {
    for dir in [image_dir, label_dir] {
        if !dir.is_dir() {
            return Err(Error::MissingDirectory {
                path: dir.to_path_buf(),
            });
        }
    }

    let image_count = count_files(image_dir).map_err(|e| Error::io(image_dir, e))?;
    let label_count = count_files(label_dir).map_err(|e| Error::io(label_dir, e))?;

    let mut listed: Vec<(String, usize)> = classes.iter().map(|c| (c.clone(), 0)).collect();
    let mut others: BTreeMap<String, usize> = BTreeMap::new();

    let store = AnnotationStore::new(label_dir);
    for name in store.list()? {
        let annotation = store.read(&name)?;
        for object in &annotation.objects {
            match listed.iter_mut().find(|(c, _)| *c == object.class_name) {
                Some((_, count)) => *count += 1,
                None => *others.entry(object.class_name.clone()).or_insert(0) += 1,
            }
        }
    }

    listed.extend(others);
    Ok(DatasetStats {
        image_count,
        label_count,
        instances: listed,
    })
}
