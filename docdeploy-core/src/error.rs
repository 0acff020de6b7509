//! Error types for docdeploy-core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// All errors that can arise while discovering and loading descriptors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML descriptor could not be decoded.
    #[error("failed to parse descriptor at {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON descriptor could not be decoded.
    #[error("failed to parse descriptor at {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An env file exists but holds a malformed line.
    #[error("failed to read env file {path}: {source}")]
    DotEnv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// `--config-parser` named something other than yml, yaml or json.
    #[error("parser {0} not supported")]
    UnsupportedParser(String),

    /// A search path that is neither a directory nor a regular file.
    #[error("path {} has an unsupported type", .0.display())]
    UnsupportedPath(PathBuf),

    /// A directory walk found no matching descriptor.
    #[error("no documents found in path {} ({scanned} files scanned in {elapsed:?})", .path.display())]
    NoDocuments {
        path: PathBuf,
        scanned: usize,
        elapsed: Duration,
    },
}

/// Convenience constructor for [`LoadError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.into(),
        source,
    }
}
