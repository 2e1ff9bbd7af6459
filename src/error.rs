use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The file is not a readable word-processing package.
    #[error("invalid or damaged document: {0}")]
    CorruptPackage(String),

    #[error("no non-empty paragraph to use as title")]
    NoTitleExtracted,

    /// A single embedded image could not be extracted. Never aborts a file.
    #[error("failed to extract image {id}: {reason}")]
    ImageExtraction { id: String, reason: String },

    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("legacy document conversion failed: {0}")]
    Conversion(String),

    #[error("legacy document conversion is not available")]
    ConversionUnavailable,

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error ends the pipeline for the current file.
    pub fn is_fatal_for_file(&self) -> bool {
        !matches!(self, Error::ImageExtraction { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::CorruptPackage(other.to_string()),
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::CorruptPackage(format!("malformed XML: {err}"))
    }
}
