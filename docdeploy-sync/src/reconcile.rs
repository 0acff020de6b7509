//! Single-document reconciliation against a [`DocumentRegistry`].
//!
//! Deploy runs resolve → existence check → create-or-update → permission
//! sync → tag sync (update path only). Remove runs existence check → unshare
//! or delete. Each step failure is fatal to the document and tagged with the
//! [`Stage`](crate::error::Stage) it happened in.

use tracing::{debug, info, warn};

use docdeploy_content::resolve;
use docdeploy_core::Document;

use crate::diff::{diff_principals, diff_tags};
use crate::error::{ReconcileError, RegistryError};
use crate::registry::{
    CreateDocumentRequest, DocumentRegistry, ModifyPermissionRequest, PermissionType,
    ResourceType, Tag, UpdateDocumentRequest, LATEST_VERSION,
};

/// How a successful deploy left the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    Created,
    /// A new version was created and made the default.
    Updated,
    /// The registry already held identical content; no new version.
    ContentUnchanged,
}

/// How a successful remove left the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Nothing to remove.
    Absent,
    /// Sharing was revoked; the document itself still exists.
    Unshared,
    Deleted,
}

/// Bring one document in line with its declared configuration.
pub async fn deploy_document<R: DocumentRegistry>(
    registry: &R,
    document: &Document,
) -> Result<DeployOutcome, ReconcileError> {
    let name = document.name.as_str();

    let resolved = resolve(document).map_err(|source| ReconcileError::Content {
        document: name.to_string(),
        source,
    })?;

    let create_err = |source: RegistryError| ReconcileError::CreateOrUpdate {
        document: name.to_string(),
        source,
    };

    let existing = registry.get_document(name).await.map_err(create_err)?;

    let outcome = match existing {
        None => {
            info!("[{name}] Creating..");
            registry
                .create_document(CreateDocumentRequest {
                    name: name.to_string(),
                    format: resolved.format,
                    document_type: document.document_type.clone(),
                    content: resolved.payload,
                    tags: document
                        .tags
                        .iter()
                        .map(|(k, v)| Tag::new(k, v))
                        .collect(),
                })
                .await
                .map_err(create_err)?;
            DeployOutcome::Created
        }
        Some(current) => {
            info!("[{name}] Updating..");
            let update = registry
                .update_document(UpdateDocumentRequest {
                    name: name.to_string(),
                    format: resolved.format,
                    content: resolved.payload,
                    version: LATEST_VERSION.to_string(),
                })
                .await;
            match update {
                Ok(version) => {
                    registry
                        .update_default_version(name, &version)
                        .await
                        .map_err(create_err)?;
                    debug!(
                        document = name,
                        from = %current.default_version,
                        to = %version,
                        "default version promoted"
                    );
                    DeployOutcome::Updated
                }
                Err(RegistryError::DuplicateContent) => {
                    debug!(document = name, "content unchanged");
                    DeployOutcome::ContentUnchanged
                }
                Err(source) => return Err(create_err(source)),
            }
        }
    };

    sync_permissions(registry, document).await?;

    if outcome != DeployOutcome::Created {
        sync_tags(registry, document).await?;
    }

    info!("[{name}] Deploy completed!");
    Ok(outcome)
}

async fn sync_permissions<R: DocumentRegistry>(
    registry: &R,
    document: &Document,
) -> Result<(), ReconcileError> {
    let name = document.name.as_str();
    let perm_err = |source: RegistryError| ReconcileError::PermissionSync {
        document: name.to_string(),
        source,
    };

    let live = registry
        .describe_permission(name, PermissionType::Share)
        .await
        .map_err(perm_err)?;
    if document.account_ids.is_empty() && live.is_empty() {
        return Ok(());
    }

    let diff = diff_principals(&document.account_ids, &live);
    if diff.is_empty() {
        return Ok(());
    }
    debug!(
        document = name,
        add = ?diff.to_add,
        remove = ?diff.to_remove,
        "modifying shared principals"
    );
    registry
        .modify_permission(ModifyPermissionRequest {
            name: name.to_string(),
            permission_type: PermissionType::Share,
            account_ids_to_add: diff.to_add,
            account_ids_to_remove: diff.to_remove,
        })
        .await
        .map_err(perm_err)
}

async fn sync_tags<R: DocumentRegistry>(
    registry: &R,
    document: &Document,
) -> Result<(), ReconcileError> {
    let name = document.name.as_str();
    let tag_err = |source: RegistryError| ReconcileError::TagSync {
        document: name.to_string(),
        source,
    };

    let live = registry
        .list_tags(name, ResourceType::Document)
        .await
        .map_err(tag_err)?;
    if document.tags.is_empty() && live.is_empty() {
        return Ok(());
    }

    let diff = diff_tags(&document.tags, &live);
    if diff.is_empty() {
        return Ok(());
    }

    info!("[{name}] Updating tags..");
    if !diff.to_add.is_empty() {
        registry
            .add_tags(name, ResourceType::Document, diff.to_add)
            .await
            .map_err(tag_err)?;
    }
    if !diff.keys_to_remove.is_empty() {
        registry
            .remove_tags(name, ResourceType::Document, diff.keys_to_remove)
            .await
            .map_err(tag_err)?;
    }
    Ok(())
}

/// Remove one document. A shared document is only unshared on this pass;
/// running remove again deletes it.
pub async fn remove_document<R: DocumentRegistry>(
    registry: &R,
    document: &Document,
) -> Result<RemoveOutcome, ReconcileError> {
    let name = document.name.as_str();
    let delete_err = |source: RegistryError| ReconcileError::Delete {
        document: name.to_string(),
        source,
    };

    if registry.get_document(name).await.map_err(delete_err)?.is_none() {
        debug!(document = name, "not deployed, nothing to remove");
        return Ok(RemoveOutcome::Absent);
    }

    info!("[{name}] Removing..");
    let shared = registry
        .describe_permission(name, PermissionType::Share)
        .await
        .map_err(delete_err)?;

    if !shared.is_empty() {
        registry
            .modify_permission(ModifyPermissionRequest {
                name: name.to_string(),
                permission_type: PermissionType::Share,
                account_ids_to_add: Vec::new(),
                account_ids_to_remove: shared,
            })
            .await
            .map_err(|source| ReconcileError::PermissionSync {
                document: name.to_string(),
                source,
            })?;
        warn!("[{name}] Sharing revoked; run remove again to delete the document");
        return Ok(RemoveOutcome::Unshared);
    }

    registry.delete_document(name).await.map_err(delete_err)?;
    info!("[{name}] Remove completed!");
    Ok(RemoveOutcome::Deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::memory::{Call, MemoryRegistry, Op};
    use docdeploy_core::{ContentSource, DocumentFormat};
    use std::fs;
    use tempfile::TempDir;

    fn script_doc(dir: &TempDir) -> Document {
        let script = dir.path().join("script.sh");
        fs::write(&script, "echo hello").expect("write");
        Document::new("demo").with_content(ContentSource::File(script))
    }

    #[tokio::test]
    async fn content_failure_stops_before_any_registry_call() {
        let registry = MemoryRegistry::new();
        let doc = Document::new("demo");

        let err = deploy_document(&registry, &doc).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Content);
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn existence_check_failure_is_create_or_update() {
        let dir = TempDir::new().expect("dir");
        let registry = MemoryRegistry::new();
        registry.fail_on(
            Op::GetDocument,
            "demo",
            RegistryError::Transport("timed out".into()),
        );

        let err = deploy_document(&registry, &script_doc(&dir))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::CreateOrUpdate);
    }

    #[tokio::test]
    async fn promotion_failure_is_create_or_update() {
        let dir = TempDir::new().expect("dir");
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Json, "{}");
        registry.fail_on(
            Op::UpdateDefaultVersion,
            "demo",
            RegistryError::service("InternalServerError", "boom"),
        );

        let err = deploy_document(&registry, &script_doc(&dir))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::CreateOrUpdate);
    }

    #[tokio::test]
    async fn update_promotes_new_version_and_replaces_tags() {
        let dir = TempDir::new().expect("dir");
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Json, "{}");
        registry.tag("demo", "env", "dev");
        registry.tag("demo", "stale", "x");

        let doc = script_doc(&dir).with_tag("env", "prod");
        let outcome = deploy_document(&registry, &doc).await.expect("deploy");
        assert_eq!(outcome, DeployOutcome::Updated);

        let snapshot = registry.document("demo").expect("stored");
        assert_eq!(snapshot.version_count, 2);
        assert_eq!(snapshot.default_version, 2);
        assert_eq!(snapshot.tags.len(), 1);
        assert_eq!(snapshot.tags["env"], "prod");

        let ops: Vec<Op> = registry.calls().iter().map(Call::op).collect();
        assert_eq!(
            ops,
            vec![
                Op::GetDocument,
                Op::UpdateDocument,
                Op::UpdateDefaultVersion,
                Op::DescribePermission,
                Op::ListTags,
                Op::AddTags,
                Op::RemoveTags,
            ]
        );
    }

    #[tokio::test]
    async fn tag_failure_is_tag_sync() {
        let dir = TempDir::new().expect("dir");
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Json, "{}");
        registry.fail_on(
            Op::AddTags,
            "demo",
            RegistryError::service("TooManyTagsError", "limit"),
        );

        let doc = script_doc(&dir).with_tag("env", "prod");
        let err = deploy_document(&registry, &doc).await.unwrap_err();
        assert_eq!(err.stage(), Stage::TagSync);
        assert_eq!(err.document(), "demo");
    }

    #[tokio::test]
    async fn tag_removal_failure_is_tag_sync() {
        let dir = TempDir::new().expect("dir");
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Json, "{}");
        registry.tag("demo", "stale", "x");
        registry.fail_on(
            Op::RemoveTags,
            "demo",
            RegistryError::service("InvalidResourceId", "gone"),
        );

        let err = deploy_document(&registry, &script_doc(&dir))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::TagSync);
        assert_eq!(err.document(), "demo");
        assert_eq!(registry.calls().last().map(Call::op), Some(Op::RemoveTags));
    }

    #[tokio::test]
    async fn shared_document_is_unshared_then_deleted_on_second_pass() {
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Text, "x");
        registry.share("demo", &["111", "222"]);
        let doc = Document::new("demo");

        let first = remove_document(&registry, &doc).await.expect("remove");
        assert_eq!(first, RemoveOutcome::Unshared);
        assert!(registry.document("demo").expect("still there").shared_with.is_empty());

        let second = remove_document(&registry, &doc).await.expect("remove");
        assert_eq!(second, RemoveOutcome::Deleted);
        assert!(registry.document("demo").is_none());
    }

    #[tokio::test]
    async fn unshare_failure_is_permission_sync() {
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Text, "x");
        registry.share("demo", &["111"]);
        registry.fail_on(
            Op::ModifyPermission,
            "demo",
            RegistryError::service("AccessDenied", "no"),
        );

        let err = remove_document(&registry, &Document::new("demo"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::PermissionSync);
    }

    #[tokio::test]
    async fn delete_failure_is_delete_stage() {
        let registry = MemoryRegistry::new();
        registry.put_document("demo", DocumentFormat::Text, "x");
        registry.fail_on(
            Op::DeleteDocument,
            "demo",
            RegistryError::service("InternalServerError", "boom"),
        );

        let err = remove_document(&registry, &Document::new("demo"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Delete);
    }
}
