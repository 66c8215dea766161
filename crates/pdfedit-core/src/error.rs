use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`DocumentEngine`](crate::engine::DocumentEngine).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Operation not supported by this engine: {0}")]
    Unsupported(&'static str),
}

#[derive(Error, Debug)]
pub enum PdfEditError {
    #[error("Failed to load document: {0}")]
    Load(#[source] EngineError),

    #[error("Failed to import pages: {0}")]
    Import(#[source] EngineError),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("No document is open")]
    NoDocument,

    #[error("Document has never been saved")]
    NoSourcePath,

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("Failed to export {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error("PDF operation failed: {0}")]
    Operation(#[source] EngineError),

    #[error("Thumbnail rendering failed: {0}")]
    Render(#[source] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PdfEditError {
    pub(crate) fn save(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PdfEditError::Save {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn export(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PdfEditError::Export {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
