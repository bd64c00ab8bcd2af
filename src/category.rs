//! Fixed COCO category table used when labelling VOC objects.

/// Class name given to detections whose category id is not in the table.
pub const UNIDENTIFIED: &str = "unidentified";

// COCO ids kept for the street-scene dataset. 8 (truck) is folded into car.
const CATEGORY_TABLE: &[(u32, &str)] = &[
    (1, "person"),
    (2, "bicycle"),
    (3, "car"),
    (4, "motorcycle"),
    (6, "bus"),
    (8, "car"),
    (14, "bench"),
    (57, "chair"),
];

/// Lookup from COCO category id to class name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryMap;

impl CategoryMap {
    /// Class name for a known category id.
    pub fn get(&self, category_id: u32) -> Option<&'static str> {
        CATEGORY_TABLE
            .iter()
            .find(|(id, _)| *id == category_id)
            .map(|(_, name)| *name)
    }

    /// Class name for any category id, falling back to [`UNIDENTIFIED`].
    pub fn class_name(&self, category_id: u32) -> &'static str {
        self.get(category_id).unwrap_or(UNIDENTIFIED)
    }

    /// Distinct class names in table order.
    pub fn class_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::with_capacity(CATEGORY_TABLE.len());
        for &(_, name) in CATEGORY_TABLE {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
