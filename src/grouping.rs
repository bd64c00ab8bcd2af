//! Clustering of flat detection records into per-image groups.
//!
//! Records are expected to arrive with all entries of one image adjacent to
//! each other; this is not verified. An image id that shows up again after a
//! different id starts a new group.

use log::debug;

use crate::types::DetectionRecord;

/// Group consecutive items sharing the key returned by `image_id`.
///
/// The item that reveals an id change is held back from the group being
/// flushed and becomes the seed of the next buffer. The last buffer, seed
/// included, is flushed once the input is exhausted.
pub fn group_consecutive<T, F>(
    items: impl IntoIterator<Item = T>,
    image_id: F,
) -> Vec<(u64, Vec<T>)>
where
    F: Fn(&T) -> u64,
{
    let mut groups = Vec::new();
    let mut buffer: Vec<T> = Vec::new();
    let mut prev_id = 0;

    for item in items {
        let new_id = image_id(&item);
        if !buffer.is_empty() && new_id != prev_id {
            debug!("Read all annotations for image {}", prev_id);
            groups.push((prev_id, std::mem::take(&mut buffer)));
        }
        if buffer.is_empty() {
            prev_id = new_id;
        }
        buffer.push(item);
    }

    if !buffer.is_empty() {
        debug!("Read all annotations for image {}", prev_id);
        groups.push((prev_id, buffer));
    }
    groups
}

/// Group detection records by image id, keeping first-seen group order and
/// the input order within each group.
pub fn group_by_image(
    records: impl IntoIterator<Item = DetectionRecord>,
) -> Vec<(u64, Vec<DetectionRecord>)> {
    group_consecutive(records, |record| record.image_id)
}
