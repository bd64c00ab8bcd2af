use glob::glob;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::coco::ImageAnnotationFile;
use crate::error::{Error, Result};
use crate::types::AnnotationDocument;
use crate::voc::{self, VocAnnotation};

/// Directory of VOC annotation files, one per image.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    dir: PathBuf,
}

impl AnnotationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Serialize a document and store it as `<12-digit-id>.xml`, replacing
    /// any existing file. Returns the written path.
    pub fn write(&self, doc: &AnnotationDocument) -> Result<PathBuf> {
        let name = doc.xml_name();
        self.write_bytes(&name, &voc::serialize(doc))
    }

    /// Replace a stored file with the given annotation.
    pub fn rewrite(&self, name: &str, annotation: &VocAnnotation) -> Result<PathBuf> {
        self.write_bytes(name, annotation.to_xml().as_bytes())
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_of(name);
        let storage_error = |source| Error::StorageWriteFailure {
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(storage_error)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes).map_err(storage_error)?;
        writer.flush().map_err(storage_error)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Parse a stored annotation file.
    pub fn read(&self, name: &str) -> Result<VocAnnotation> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(Error::PostProcessTargetMissing { path });
        }
        let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
        voc::parse(&bytes).map_err(|source| Error::Xml { path, source })
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        fs::remove_file(&path).map_err(|source| Error::StorageWriteFailure { path, source })
    }

    /// File names of all stored `*.xml` files, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = list_files(&self.dir, "xml")?
            .into_iter()
            .filter_map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

/// List the files with the given extension directly inside `dir`.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }
    let pattern = format!("{}/*.{}", glob::Pattern::escape(&dir.to_string_lossy()), extension);
    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

/// Read a per-image JSON annotation file.
///
/// A file without any detection records is an error for that file.
pub fn read_image_json(path: &Path) -> Result<ImageAnnotationFile> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let parsed: ImageAnnotationFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if parsed.annotation.is_empty() {
        return Err(Error::EmptyAnnotation {
            path: path.to_path_buf(),
        });
    }
    Ok(parsed)
}
