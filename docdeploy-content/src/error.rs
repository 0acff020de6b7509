//! Error types for docdeploy-content.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving a document's content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A script or content file could not be read.
    #[error("cannot read content at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structured content could not be encoded as JSON.
    #[error("content serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The referenced file's extension maps to no known format.
    #[error("provided file {} has an unsupported extension", .path.display())]
    UnsupportedExtension { path: PathBuf },

    /// The descriptor declares neither content nor a file.
    #[error("cannot generate document content: no content or file declared")]
    NoContent,
}

pub(crate) fn read_err(path: impl Into<PathBuf>, source: std::io::Error) -> ContentError {
    ContentError::Read {
        path: path.into(),
        source,
    }
}
