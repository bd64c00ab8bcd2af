//! PASCAL VOC annotation files
//!
//! Reading goes through `serde-xml-rs` into private raw structs; writing is
//! done by hand so the element order and indentation stay fixed:
//!
//! ```text
//! <annotation>
//!     <folder/> <filename/> <source>...</source> <size>...</size>
//!     <object><name/><bndbox>xmin ymin xmax ymax</bndbox></object>*
//! </annotation>
//! ```

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{AnnotationDocument, BoundingBox, IMAGE_DEPTH};

pub const COCO_FOLDER: &str = "Coco";
pub const COCO_DATABASE: &str = "StreetVision Inference Dataset";
pub const COCO_ANNOTATION: &str = "PASCAL VOC";
pub const COCO_IMAGE: &str = "MS COCO-Dataset (Common Objects in Context)";

/// Provenance block written under `<source>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VocSource {
    pub database: String,
    pub annotation: String,
    pub image: String,
}

impl VocSource {
    /// Provenance stamped on documents converted from COCO records.
    pub fn coco() -> Self {
        Self {
            database: COCO_DATABASE.to_string(),
            annotation: COCO_ANNOTATION.to_string(),
            image: COCO_IMAGE.to_string(),
        }
    }
}

/// In-memory view of a VOC annotation file, ours or third-party.
#[derive(Debug, Clone, PartialEq)]
pub struct VocAnnotation {
    pub folder: String,
    pub filename: String,
    pub source: VocSource,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub objects: Vec<BoundingBox>,
}

impl From<&AnnotationDocument> for VocAnnotation {
    fn from(doc: &AnnotationDocument) -> Self {
        Self {
            folder: COCO_FOLDER.to_string(),
            filename: doc.file_name.clone(),
            source: VocSource::coco(),
            width: doc.width,
            height: doc.height,
            depth: doc.depth,
            objects: doc.boxes.clone(),
        }
    }
}

impl TryFrom<VocAnnotation> for AnnotationDocument {
    type Error = Error;

    /// Recover a document from a VOC file whose name is a numeric image id.
    fn try_from(voc: VocAnnotation) -> Result<Self> {
        let stem = Path::new(&voc.filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let image_id = stem.parse::<u64>().map_err(|_| Error::MalformedRecord {
            image_id: 0,
            reason: format!("file name {:?} is not a numeric image id", voc.filename),
        })?;
        Ok(AnnotationDocument {
            image_id,
            file_name: voc.filename,
            width: voc.width,
            height: voc.height,
            depth: voc.depth,
            boxes: voc.objects,
        })
    }
}

impl VocAnnotation {
    /// Render the annotation as VOC XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(384 + self.objects.len() * 160);
        xml.push_str("<annotation>\n");
        push_text(&mut xml, 1, "folder", &self.folder);
        push_text(&mut xml, 1, "filename", &self.filename);
        push_open(&mut xml, 1, "source");
        push_text(&mut xml, 2, "database", &self.source.database);
        push_text(&mut xml, 2, "annotation", &self.source.annotation);
        push_text(&mut xml, 2, "image", &self.source.image);
        push_close(&mut xml, 1, "source");
        push_open(&mut xml, 1, "size");
        push_text(&mut xml, 2, "width", &self.width.to_string());
        push_text(&mut xml, 2, "height", &self.height.to_string());
        push_text(&mut xml, 2, "depth", &self.depth.to_string());
        push_close(&mut xml, 1, "size");
        for object in &self.objects {
            push_open(&mut xml, 1, "object");
            push_text(&mut xml, 2, "name", &object.class_name);
            push_open(&mut xml, 2, "bndbox");
            push_text(&mut xml, 3, "xmin", &object.xmin.to_string());
            push_text(&mut xml, 3, "ymin", &object.ymin.to_string());
            push_text(&mut xml, 3, "xmax", &object.xmax.to_string());
            push_text(&mut xml, 3, "ymax", &object.ymax.to_string());
            push_close(&mut xml, 2, "bndbox");
            push_close(&mut xml, 1, "object");
        }
        xml.push_str("</annotation>\n");
        xml
    }

    /// Parse VOC XML. Unknown elements such as `pose` or `part` are skipped,
    /// and `<object>` entries need not be adjacent. Non-finite numbers are
    /// rejected.
    pub fn from_xml(bytes: &[u8]) -> std::result::Result<Self, serde_xml_rs::Error> {
        let raw: RawAnnotation = serde_xml_rs::from_reader(bytes)?;
        Ok(raw.into())
    }

    /// Number of objects with the given class name.
    pub fn count_class(&self, class_name: &str) -> usize {
        self.objects
            .iter()
            .filter(|object| object.class_name == class_name)
            .count()
    }
}

/// Serialize a document into VOC XML bytes.
pub fn serialize(doc: &AnnotationDocument) -> Vec<u8> {
    VocAnnotation::from(doc).to_xml().into_bytes()
}

/// Parse VOC XML bytes.
pub fn parse(bytes: &[u8]) -> std::result::Result<VocAnnotation, serde_xml_rs::Error> {
    VocAnnotation::from_xml(bytes)
}

fn indent(xml: &mut String, depth: usize) {
    for _ in 0..depth {
        xml.push('\t');
    }
}

fn push_open(xml: &mut String, depth: usize, tag: &str) {
    indent(xml, depth);
    xml.push_str(&format!("<{}>\n", tag));
}

fn push_close(xml: &mut String, depth: usize, tag: &str) {
    indent(xml, depth);
    xml.push_str(&format!("</{}>\n", tag));
}

fn push_text(xml: &mut String, depth: usize, tag: &str, text: &str) {
    indent(xml, depth);
    xml.push_str(&format!("<{}>{}</{}>\n", tag, escape(text), tag));
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug)]
struct RawAnnotation {
    folder: String,
    filename: String,
    source: RawSource,
    size: RawSize,
    objects: Vec<RawObject>,
}

// Objects are collected one element at a time so that other elements may sit
// between them; a derived `Vec` field only accepts a contiguous run.
impl<'de> Deserialize<'de> for RawAnnotation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct("annotation", ANNOTATION_FIELDS, RawAnnotationVisitor)
    }
}

const ANNOTATION_FIELDS: &[&str] = &["folder", "filename", "source", "size", "object"];

struct RawAnnotationVisitor;

impl<'de> Visitor<'de> for RawAnnotationVisitor {
    type Value = RawAnnotation;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a VOC annotation element")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<RawAnnotation, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut folder = None;
        let mut filename = None;
        let mut source = None;
        let mut size = None;
        let mut objects = Vec::new();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "folder" => folder = Some(map.next_value()?),
                "filename" => filename = Some(map.next_value()?),
                "source" => source = Some(map.next_value()?),
                "size" => size = Some(map.next_value()?),
                "object" => objects.push(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(RawAnnotation {
            folder: folder.unwrap_or_default(),
            filename: filename.unwrap_or_default(),
            source: source.unwrap_or_default(),
            size: size.ok_or_else(|| de::Error::missing_field("size"))?,
            objects,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    #[serde(default)]
    database: String,
    #[serde(default)]
    annotation: String,
    #[serde(default)]
    image: String,
}

#[derive(Debug, Deserialize)]
struct RawSize {
    #[serde(deserialize_with = "de_dimension")]
    width: u32,
    #[serde(deserialize_with = "de_dimension")]
    height: u32,
    #[serde(default = "default_depth", deserialize_with = "de_dimension")]
    depth: u32,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    name: String,
    bndbox: RawBndBox,
}

// Some labelling tools write sub-pixel corners; they are truncated.
#[derive(Debug, Deserialize)]
struct RawBndBox {
    #[serde(deserialize_with = "de_coordinate")]
    xmin: i64,
    #[serde(deserialize_with = "de_coordinate")]
    ymin: i64,
    #[serde(deserialize_with = "de_coordinate")]
    xmax: i64,
    #[serde(deserialize_with = "de_coordinate")]
    ymax: i64,
}

impl From<RawAnnotation> for VocAnnotation {
    fn from(raw: RawAnnotation) -> Self {
        Self {
            folder: raw.folder,
            filename: raw.filename,
            source: VocSource {
                database: raw.source.database,
                annotation: raw.source.annotation,
                image: raw.source.image,
            },
            width: raw.size.width,
            height: raw.size.height,
            depth: raw.size.depth,
            objects: raw
                .objects
                .into_iter()
                .map(|object| {
                    BoundingBox::new(
                        object.name,
                        object.bndbox.xmin,
                        object.bndbox.ymin,
                        object.bndbox.xmax,
                        object.bndbox.ymax,
                    )
                })
                .collect(),
        }
    }
}

fn default_depth() -> u32 {
    IMAGE_DEPTH
}

fn de_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|e| de::Error::custom(format!("invalid number {:?}: {}", text, e)))?;
    if !value.is_finite() {
        return Err(de::Error::custom(format!("non-finite number {:?}", text)));
    }
    Ok(value)
}

fn de_coordinate<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    de_number(deserializer).map(|value| value.trunc() as i64)
}

fn de_dimension<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = de_number(deserializer)?;
    if value < 0.0 {
        return Err(de::Error::custom(format!(
            "negative image dimension {}",
            value
        )));
    }
    Ok(value.trunc() as u32)
}
