//! The remote document registry as seen by the reconciler.
//!
//! [`DocumentRegistry`] is the only seam between the engine and the outside
//! world. Implementations must be cheap to share (`Arc<R>`) and safe to call
//! from many tasks at once; the engine never mutates them.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use docdeploy_core::DocumentFormat;

use crate::error::RegistryError;

/// Version selector targeting the newest version of a document.
pub const LATEST_VERSION: &str = "$LATEST";

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// A resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Kind of permission being described or modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionType {
    #[default]
    Share,
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionType::Share => write!(f, "Share"),
        }
    }
}

/// Kind of resource addressed by tag calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceType {
    #[default]
    Document,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Document => write!(f, "Document"),
        }
    }
}

/// What the registry reports about an existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDescription {
    pub name: String,
    pub document_type: String,
    pub format: DocumentFormat,
    pub latest_version: String,
    pub default_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub format: DocumentFormat,
    pub document_type: String,
    pub content: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDocumentRequest {
    pub name: String,
    pub format: DocumentFormat,
    pub content: String,
    /// Version being updated; the engine always sends [`LATEST_VERSION`].
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyPermissionRequest {
    pub name: String,
    pub permission_type: PermissionType,
    pub account_ids_to_add: Vec<String>,
    pub account_ids_to_remove: Vec<String>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Logical operations offered by a remote document registry.
pub trait DocumentRegistry: Send + Sync {
    /// `Ok(None)` when no document with `name` exists.
    fn get_document(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DocumentDescription>, RegistryError>> + Send;

    fn create_document(
        &self,
        request: CreateDocumentRequest,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    /// Returns the new version, or [`RegistryError::DuplicateContent`] when
    /// the content matches the active version.
    fn update_document(
        &self,
        request: UpdateDocumentRequest,
    ) -> impl Future<Output = Result<String, RegistryError>> + Send;

    /// Make `version` the active (default) version.
    fn update_default_version(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn describe_permission(
        &self,
        name: &str,
        permission_type: PermissionType,
    ) -> impl Future<Output = Result<Vec<String>, RegistryError>> + Send;

    fn modify_permission(
        &self,
        request: ModifyPermissionRequest,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn list_tags(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
    ) -> impl Future<Output = Result<Vec<Tag>, RegistryError>> + Send;

    fn add_tags(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
        tags: Vec<Tag>,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn remove_tags(
        &self,
        resource_id: &str,
        resource_type: ResourceType,
        keys: Vec<String>,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    fn delete_document(&self, name: &str)
        -> impl Future<Output = Result<(), RegistryError>> + Send;

    /// Account the registry acts on behalf of; `None` means no usable identity.
    fn caller_account_id(&self) -> impl Future<Output = Result<Option<String>, RegistryError>> + Send;
}
