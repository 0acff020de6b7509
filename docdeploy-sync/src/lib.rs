//! # docdeploy-sync
//!
//! Reconciliation engine: computes permission and tag differences, brings a
//! single document in line with its declared state through a
//! [`DocumentRegistry`], and fans that out over many documents in bounded
//! parallel chunks.
//!
//! Call [`pipeline::deploy`] or [`pipeline::remove`] with any registry
//! implementation. [`MemoryRegistry`] is a deterministic in-process registry
//! used by tests.

pub mod batch;
pub mod diff;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod reconcile;
pub mod registry;

pub use batch::{run_batch, BatchOptions, BatchSummary, Operation};
pub use diff::{diff_principals, diff_tags, PrincipalDiff, TagDiff};
pub use error::{BatchError, ReconcileError, RegistryError, Stage};
pub use memory::MemoryRegistry;
pub use reconcile::{deploy_document, remove_document, DeployOutcome, RemoveOutcome};
pub use registry::{
    CreateDocumentRequest, DocumentDescription, DocumentRegistry, ModifyPermissionRequest,
    PermissionType, ResourceType, Tag, UpdateDocumentRequest, LATEST_VERSION,
};
