use log::{error, info};
use std::collections::BTreeSet;
use std::path::Path;

use crate::category::UNIDENTIFIED;
use crate::coco::{Annotation, CocoIndex};
use crate::config::ConvertOptions;
use crate::conversion::build_document;
use crate::error::{Error, Result};
use crate::grouping::group_consecutive;
use crate::io::{list_files, read_image_json, AnnotationStore};
use crate::postprocess::post_process_document;
use crate::types::{AnnotationDocument, DetectionRecord, ProcessingStats};
use crate::utils::{create_output_directory, create_progress_bar};

/// Build the document of one image group taken from a COCO instances file.
pub fn convert_group(
    index: &CocoIndex,
    image_id: u64,
    annotations: &[&Annotation],
) -> Result<AnnotationDocument> {
    let records = annotations
        .iter()
        .map(|annotation| DetectionRecord::try_from(*annotation))
        .collect::<Result<Vec<_>>>()?;
    let (width, height) = index.image_size(image_id).ok_or_else(|| Error::MalformedRecord {
        image_id,
        reason: "image is not listed in the images table, missing width and height".to_string(),
    })?;
    build_document(image_id, &records, width, height)
}

// Log a failed document and decide whether the run goes on
fn handle_failure(
    what: &str,
    e: Error,
    stats: &mut ProcessingStats,
    options: &ConvertOptions,
) -> Result<()> {
    stats.failed_documents += 1;
    error!("{}: {}", what, e);
    if options.fail_fast {
        Err(e)
    } else {
        Ok(())
    }
}

fn record_written(
    doc: &AnnotationDocument,
    stats: &mut ProcessingStats,
    written: &mut BTreeSet<String>,
) {
    stats.written_documents += 1;
    stats.unidentified_boxes += doc
        .boxes
        .iter()
        .filter(|b| b.class_name == UNIDENTIFIED)
        .count();
    written.insert(doc.xml_name());
}

/// Group the records of a loaded COCO file by image and write one VOC file
/// per group, then drop unidentified objects from the written files.
pub fn convert_coco_index(
    index: &CocoIndex,
    store: &AnnotationStore,
    options: &ConvertOptions,
) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::new();
    let mut written = BTreeSet::new();

    // Group membership is settled before any document is built
    let groups = group_consecutive(index.annotations().iter(), |annotation| annotation.image_id);
    stats.total_groups = groups.len();
    info!("Read annotations for {} images.", groups.len());

    let pb = create_progress_bar(groups.len() as u64, "Convert");
    for (image_id, annotations) in &groups {
        let outcome = convert_group(index, *image_id, annotations)
            .and_then(|doc| store.write(&doc).map(|_| doc));
        match outcome {
            Ok(doc) => record_written(&doc, &mut stats, &mut written),
            Err(e) => {
                let what = format!("image {}", image_id);
                if let Err(e) = handle_failure(&what, e, &mut stats, options) {
                    pb.abandon();
                    return Err(e);
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Conversion complete");

    finish(store, &written, &mut stats, options)?;
    Ok(stats)
}

/// Convert a COCO instances file into a directory of VOC files.
pub fn process_coco_dataset(
    annotations_path: &Path,
    options: &ConvertOptions,
) -> Result<ProcessingStats> {
    let output = create_output_directory(&options.output, options.clean)
        .map_err(|e| Error::io(&options.output, e))?;
    let index = CocoIndex::load(annotations_path)?;
    convert_coco_index(&index, &AnnotationStore::new(output), options)
}

/// Convert a directory of per-image JSON files into VOC files.
///
/// Each file becomes one document named after the image id of its first
/// record. Files without records are reported and skipped.
pub fn process_json_dir(json_dir: &Path, options: &ConvertOptions) -> Result<ProcessingStats> {
    let files = list_files(json_dir, "json")?;
    let output = create_output_directory(&options.output, options.clean)
        .map_err(|e| Error::io(&options.output, e))?;
    let store = AnnotationStore::new(output);

    let mut stats = ProcessingStats::new();
    let mut written = BTreeSet::new();
    stats.total_groups = files.len();
    info!("Found {} JSON files in {}.", files.len(), json_dir.display());

    let pb = create_progress_bar(files.len() as u64, "Convert");
    for path in &files {
        info!("Processing {}", path.display());
        let outcome = convert_image_json(path).and_then(|doc| store.write(&doc).map(|_| doc));
        match outcome {
            Ok(doc) => record_written(&doc, &mut stats, &mut written),
            Err(e) => {
                let what = match e.image_id() {
                    Some(image_id) => format!("image {}", image_id),
                    None => path.display().to_string(),
                };
                if let Err(e) = handle_failure(&what, e, &mut stats, options) {
                    pb.abandon();
                    return Err(e);
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Conversion complete");

    finish(&store, &written, &mut stats, options)?;
    Ok(stats)
}

/// Build the document held in one per-image JSON file.
pub fn convert_image_json(path: &Path) -> Result<AnnotationDocument> {
    let file = read_image_json(path)?;
    let records = file
        .annotation
        .iter()
        .map(DetectionRecord::try_from)
        .collect::<Result<Vec<_>>>()?;
    let image_id = records
        .first()
        .map(|record| record.image_id)
        .ok_or_else(|| Error::EmptyAnnotation {
            path: path.to_path_buf(),
        })?;
    build_document(image_id, &records, file.image.width, file.image.height)
}

fn finish(
    store: &AnnotationStore,
    written: &BTreeSet<String>,
    stats: &mut ProcessingStats,
    options: &ConvertOptions,
) -> Result<()> {
    if options.skip_post_process {
        info!("Skipping post-processing of unidentified objects.");
        return Ok(());
    }
    info!("Removing unidentified objects from {} files...", written.len());
    for name in written {
        match post_process_document(store, name) {
            Ok(removed) => stats.removed_unidentified += removed,
            Err(e) => handle_failure(name, e, stats, options)?,
        }
    }
    Ok(())
}
