//! Error types for docdeploy-sync.

use std::fmt;

use thiserror::Error;

use docdeploy_content::ContentError;

use crate::batch::Operation;

/// Errors returned by a [`DocumentRegistry`](crate::registry::DocumentRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The named document does not exist.
    #[error("document {0} not found")]
    NotFound(String),

    /// An update carried content identical to the active version.
    #[error("document content is identical to the active version")]
    DuplicateContent,

    /// The registry rejected the request.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The request never produced a registry response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be decoded.
    #[error("failed to decode registry response: {0}")]
    Decode(String),
}

impl RegistryError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Reconciliation stage a document failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Content,
    CreateOrUpdate,
    PermissionSync,
    TagSync,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Content => write!(f, "content"),
            Stage::CreateOrUpdate => write!(f, "create-or-update"),
            Stage::PermissionSync => write!(f, "permission-sync"),
            Stage::TagSync => write!(f, "tag-sync"),
            Stage::Delete => write!(f, "delete"),
        }
    }
}

/// A single document's reconciliation failure. Fatal to that document only.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("[{document}] content resolution failed: {source}")]
    Content {
        document: String,
        #[source]
        source: ContentError,
    },

    #[error("[{document}] create/update failed: {source}")]
    CreateOrUpdate {
        document: String,
        #[source]
        source: RegistryError,
    },

    #[error("[{document}] permission sync failed: {source}")]
    PermissionSync {
        document: String,
        #[source]
        source: RegistryError,
    },

    #[error("[{document}] tag sync failed: {source}")]
    TagSync {
        document: String,
        #[source]
        source: RegistryError,
    },

    #[error("[{document}] delete failed: {source}")]
    Delete {
        document: String,
        #[source]
        source: RegistryError,
    },
}

impl ReconcileError {
    pub fn stage(&self) -> Stage {
        match self {
            ReconcileError::Content { .. } => Stage::Content,
            ReconcileError::CreateOrUpdate { .. } => Stage::CreateOrUpdate,
            ReconcileError::PermissionSync { .. } => Stage::PermissionSync,
            ReconcileError::TagSync { .. } => Stage::TagSync,
            ReconcileError::Delete { .. } => Stage::Delete,
        }
    }

    pub fn document(&self) -> &str {
        match self {
            ReconcileError::Content { document, .. }
            | ReconcileError::CreateOrUpdate { document, .. }
            | ReconcileError::PermissionSync { document, .. }
            | ReconcileError::TagSync { document, .. }
            | ReconcileError::Delete { document, .. } => document,
        }
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("parallels must be a positive integer, got {0}")]
    InvalidParallelism(usize),

    #[error("{failed} of {total} documents failed {operation}")]
    Failed {
        failed: usize,
        total: usize,
        operation: Operation,
    },
}
