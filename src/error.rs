use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised while turning detection records into VOC documents.
///
/// Every variant except [`Error::UnmappedCategory`] is fatal for the document
/// being processed. The caller decides whether to continue with the rest.
#[derive(Debug, Error)]
pub enum Error {
    /// Reported as a warning only; the box is labelled `unidentified`.
    #[error("image {image_id}: unidentified class index {category_id}")]
    UnmappedCategory { image_id: u64, category_id: u32 },

    #[error("image {image_id}: malformed record: {reason}")]
    MalformedRecord { image_id: u64, reason: String },

    #[error("failed to write annotation {}: {source}", path.display())]
    StorageWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("annotation {} does not exist", path.display())]
    PostProcessTargetMissing { path: PathBuf },

    #[error("{} does not contain any annotations", path.display())]
    EmptyAnnotation { path: PathBuf },

    #[error("directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON ({}): {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse XML ({}): {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: serde_xml_rs::Error,
    },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    pub(crate) fn malformed(image_id: u64, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            image_id,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Image id the error is attributed to, when it belongs to one document.
    pub fn image_id(&self) -> Option<u64> {
        match self {
            Error::UnmappedCategory { image_id, .. } | Error::MalformedRecord { image_id, .. } => {
                Some(*image_id)
            }
            _ => None,
        }
    }
}
