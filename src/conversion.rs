use log::warn;

use crate::category::{CategoryMap, UNIDENTIFIED};
use crate::error::{Error, Result};
use crate::types::{
    image_file_name, AnnotationDocument, BBox, BoundingBox, DetectionRecord, IMAGE_DEPTH,
};

/// Convert a COCO `[x, y, w, h]` box into VOC corner form.
///
/// Each component is truncated to an integer before the corners are summed.
/// Returns `None` when a corner does not fit in an `i64`.
pub fn to_bounding_box(class_name: &str, bbox: &BBox) -> Option<BoundingBox> {
    let x = bbox.x.trunc() as i64;
    let y = bbox.y.trunc() as i64;
    let w = bbox.w.trunc() as i64;
    let h = bbox.h.trunc() as i64;
    Some(BoundingBox::new(
        class_name,
        x,
        y,
        x.checked_add(w)?,
        y.checked_add(h)?,
    ))
}

fn validate_record(image_id: u64, record: &DetectionRecord) -> Result<()> {
    if record.image_id != image_id {
        return Err(Error::malformed(
            image_id,
            format!("record belongs to image {}", record.image_id),
        ));
    }
    let BBox { x, y, w, h } = record.bbox;
    if ![x, y, w, h].iter().all(|v| v.is_finite()) {
        return Err(Error::malformed(image_id, "bbox contains a non-finite value"));
    }
    if w < 0.0 || h < 0.0 {
        return Err(Error::malformed(
            image_id,
            format!("negative bbox size {}x{}", w, h),
        ));
    }
    Ok(())
}

/// Build the annotation document of one image from its detection records.
///
/// Unknown category ids are labelled `unidentified` and reported as a warning;
/// they are removed later by post-processing.
pub fn build_document(
    image_id: u64,
    records: &[DetectionRecord],
    width: u32,
    height: u32,
) -> Result<AnnotationDocument> {
    if width == 0 || height == 0 {
        return Err(Error::malformed(
            image_id,
            format!("missing image size ({}x{})", width, height),
        ));
    }

    let categories = CategoryMap;
    let mut boxes = Vec::with_capacity(records.len());
    for record in records {
        validate_record(image_id, record)?;
        let class_name = match categories.get(record.category_id) {
            Some(name) => name,
            None => {
                warn!(
                    "{}",
                    Error::UnmappedCategory {
                        image_id,
                        category_id: record.category_id,
                    }
                );
                UNIDENTIFIED
            }
        };
        let bbox = to_bounding_box(class_name, &record.bbox).ok_or_else(|| {
            Error::malformed(
                image_id,
                format!("bbox corners out of range: {:?}", record.bbox),
            )
        })?;
        boxes.push(bbox);
    }

    Ok(AnnotationDocument {
        image_id,
        file_name: image_file_name(image_id),
        width,
        height,
        depth: IMAGE_DEPTH,
        boxes,
    })
}
