//! Clean-up passes over stored VOC annotation files.

use log::{info, warn};
use std::fs;
use std::path::Path;

use crate::category::UNIDENTIFIED;
use crate::error::{Error, Result};
use crate::io::AnnotationStore;

/// Remove every `unidentified` object from one stored document.
///
/// The file is only rewritten when something was removed, so running the
/// pass again is a no-op. Returns the number of removed objects.
pub fn post_process_document(store: &AnnotationStore, name: &str) -> Result<usize> {
    let mut annotation = store.read(name)?;
    let before = annotation.objects.len();
    annotation
        .objects
        .retain(|object| object.class_name != UNIDENTIFIED);
    let removed = before - annotation.objects.len();
    if removed > 0 {
        info!(
            "Found {} unidentified object(s) in {}, deleting...",
            removed, name
        );
        store.rewrite(name, &annotation)?;
    }
    Ok(removed)
}

/// Post-process the named documents, stopping at the first failure.
pub fn post_process(store: &AnnotationStore, names: &[String]) -> Result<usize> {
    let mut removed = 0;
    for name in names {
        removed += post_process_document(store, name)?;
    }
    Ok(removed)
}

/// Post-process every document in the store.
pub fn post_process_all(store: &AnnotationStore) -> Result<usize> {
    let names = store.list()?;
    post_process(store, &names)
}

/// Outcome of a class filtering pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterReport {
    pub kept_documents: usize,
    pub removed_documents: usize,
    pub removed_objects: usize,
    pub removed_images: usize,
}

/// Keep only objects whose class is listed in `classes`.
///
/// Documents left without any matching object are deleted together with their
/// `<stem>.jpg` image in `image_dir`. Sub-annotations such as `part` are not
/// carried over when a document is rewritten.
pub fn filter_classes(
    store: &AnnotationStore,
    image_dir: &Path,
    classes: &[String],
) -> Result<FilterReport> {
    let mut report = FilterReport::default();

    for name in store.list()? {
        info!("Processing: {}", name);
        let mut annotation = store.read(&name)?;
        let before = annotation.objects.len();
        annotation.objects.retain(|object| {
            let keep = classes.iter().any(|class| *class == object.class_name);
            if !keep {
                info!(" | --> Wrong class detected ({}), deleting...", object.class_name);
            }
            keep
        });
        report.removed_objects += before - annotation.objects.len();

        if !annotation.objects.is_empty() {
            store.rewrite(&name, &annotation)?;
            report.kept_documents += 1;
            continue;
        }

        store.remove(&name)?;
        report.removed_documents += 1;
        let stem = Path::new(&name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image_path = image_dir.join(format!("{}.jpg", stem));
        if image_path.is_file() {
            fs::remove_file(&image_path).map_err(|source| Error::StorageWriteFailure {
                path: image_path.clone(),
                source,
            })?;
            report.removed_images += 1;
            info!(
                " | --> No matching classes found, deleted {} with corresponding image {}",
                name,
                image_path.display()
            );
        } else {
            warn!(
                " | --> No matching classes found, deleted {}; image {} does not exist",
                name,
                image_path.display()
            );
        }
    }

    Ok(report)
}
