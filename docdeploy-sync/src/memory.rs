//! In-process [`DocumentRegistry`] used by tests and local dry runs.
//!
//! Behaves like the remote registry where the engine can observe it:
//! versions are numbered from `1`, an update whose SHA-256 content hash
//! matches the active version is rejected as duplicate content, and a shared
//! document cannot be deleted. Every call is recorded in order, failures can
//! be injected per operation and document, and an optional latency makes
//! concurrent callers overlap so the peak number of in-flight calls can be
//! asserted.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sha2::{Digest, Sha256};

use docdeploy_core::DocumentFormat;

use crate::error::RegistryError;
use crate::registry::{
    CreateDocumentRequest, DocumentDescription, DocumentRegistry, ModifyPermissionRequest,
    PermissionType, ResourceType, Tag, UpdateDocumentRequest, LATEST_VERSION,
};

/// Account id reported by [`MemoryRegistry::new`].
pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

/// Registry operation names, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetDocument,
    CreateDocument,
    UpdateDocument,
    UpdateDefaultVersion,
    DescribePermission,
    ModifyPermission,
    ListTags,
    AddTags,
    RemoveTags,
    DeleteDocument,
}

/// One recorded registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetDocument { name: String },
    CreateDocument(CreateDocumentRequest),
    UpdateDocument(UpdateDocumentRequest),
    UpdateDefaultVersion { name: String, version: String },
    DescribePermission { name: String },
    ModifyPermission(ModifyPermissionRequest),
    ListTags { resource_id: String },
    AddTags { resource_id: String, tags: Vec<Tag> },
    RemoveTags { resource_id: String, keys: Vec<String> },
    DeleteDocument { name: String },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::GetDocument { .. } => Op::GetDocument,
            Call::CreateDocument(_) => Op::CreateDocument,
            Call::UpdateDocument(_) => Op::UpdateDocument,
            Call::UpdateDefaultVersion { .. } => Op::UpdateDefaultVersion,
            Call::DescribePermission { .. } => Op::DescribePermission,
            Call::ModifyPermission(_) => Op::ModifyPermission,
            Call::ListTags { .. } => Op::ListTags,
            Call::AddTags { .. } => Op::AddTags,
            Call::RemoveTags { .. } => Op::RemoveTags,
            Call::DeleteDocument { .. } => Op::DeleteDocument,
        }
    }

    /// Document (or resource) the call addressed.
    pub fn target(&self) -> &str {
        match self {
            Call::GetDocument { name }
            | Call::UpdateDefaultVersion { name, .. }
            | Call::DescribePermission { name }
            | Call::DeleteDocument { name } => name,
            Call::CreateDocument(r) => &r.name,
            Call::UpdateDocument(r) => &r.name,
            Call::ModifyPermission(r) => &r.name,
            Call::ListTags { resource_id }
            | Call::AddTags { resource_id, .. }
            | Call::RemoveTags { resource_id, .. } => resource_id,
        }
    }

    /// Whether the call changes registry state when it succeeds.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self.op(),
            Op::GetDocument | Op::DescribePermission | Op::ListTags
        )
    }
}

// ---------------------------------------------------------------------------
// Stored state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredVersion {
    content: String,
    hash: String,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    document_type: String,
    format: DocumentFormat,
    versions: Vec<StoredVersion>,
    /// 1-based index into `versions`.
    default_version: usize,
    shared_with: Vec<String>,
    tags: BTreeMap<String, String>,
}

impl StoredDocument {
    fn describe(&self, name: &str) -> DocumentDescription {
        DocumentDescription {
            name: name.to_string(),
            document_type: self.document_type.clone(),
            format: self.format,
            latest_version: self.versions.len().to_string(),
            default_version: self.default_version.to_string(),
        }
    }

    fn active(&self) -> &StoredVersion {
        &self.versions[self.default_version - 1]
    }
}

/// Read-only view of a stored document for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub document_type: String,
    pub format: DocumentFormat,
    pub active_content: String,
    pub version_count: usize,
    pub default_version: usize,
    pub shared_with: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<String, StoredDocument>,
    calls: Vec<Call>,
    failures: HashMap<(Op, String), RegistryError>,
}

impl State {
    fn record(&mut self, call: Call) -> Result<(), RegistryError> {
        let key = (call.op(), call.target().to_string());
        self.calls.push(call);
        match self.failures.get(&key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn document_mut(&mut self, name: &str) -> Result<&mut StoredDocument, RegistryError> {
        self.documents
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

fn content_hash(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Deterministic, thread-safe registry kept in memory.
#[derive(Debug)]
pub struct MemoryRegistry {
    state: Mutex<State>,
    account_id: Option<String>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            account_id: Some(DEFAULT_ACCOUNT_ID.to_string()),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_account_id(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id;
        self
    }

    /// Delay every call by `latency` (a tokio sleep).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Seed a document with a single active version.
    pub fn put_document(&self, name: &str, format: DocumentFormat, content: &str) {
        self.lock().documents.insert(
            name.to_string(),
            StoredDocument {
                document_type: "Command".to_string(),
                format,
                versions: vec![StoredVersion {
                    content: content.to_string(),
                    hash: content_hash(content),
                }],
                default_version: 1,
                shared_with: Vec::new(),
                tags: BTreeMap::new(),
            },
        );
    }

    /// Share a seeded document with `account_ids`.
    pub fn share(&self, name: &str, account_ids: &[&str]) {
        if let Some(doc) = self.lock().documents.get_mut(name) {
            doc.shared_with
                .extend(account_ids.iter().map(|id| id.to_string()));
        }
    }

    /// Tag a seeded document.
    pub fn tag(&self, name: &str, key: &str, value: &str) {
        if let Some(doc) = self.lock().documents.get_mut(name) {
            doc.tags.insert(key.to_string(), value.to_string());
        }
    }

    /// Make every `op` call on `name` fail with `error` (the call is still recorded).
    pub fn fail_on(&self, op: Op, name: &str, error: RegistryError) {
        self.lock().failures.insert((op, name.to_string()), error);
    }

    pub fn document(&self, name: &str) -> Option<DocumentSnapshot> {
        self.lock().documents.get(name).map(|doc| DocumentSnapshot {
            document_type: doc.document_type.clone(),
            format: doc.format,
            active_content: doc.active().content.clone(),
            version_count: doc.versions.len(),
            default_version: doc.default_version,
            shared_with: doc.shared_with.clone(),
            tags: doc.tags.clone(),
        })
    }

    /// Every call so far, in arrival order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls addressing `name`, in arrival order.
    pub fn calls_for(&self, name: &str) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.target() == name)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Highest number of calls that were in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight {
            counter: &self.in_flight,
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        guard
    }
}

impl DocumentRegistry for MemoryRegistry {
    async fn get_document(&self, name: &str) -> Result<Option<DocumentDescription>, RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::GetDocument {
            name: name.to_string(),
        })?;
        Ok(state.documents.get(name).map(|doc| doc.describe(name)))
    }

    async fn create_document(&self, request: CreateDocumentRequest) -> Result<(), RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::CreateDocument(request.clone()))?;
        if state.documents.contains_key(&request.name) {
            return Err(RegistryError::service(
                "DocumentAlreadyExists",
                format!("document {} already exists", request.name),
            ));
        }
        state.documents.insert(
            request.name,
            StoredDocument {
                document_type: request.document_type,
                format: request.format,
                versions: vec![StoredVersion {
                    hash: content_hash(&request.content),
                    content: request.content,
                }],
                default_version: 1,
                shared_with: Vec::new(),
                tags: request.tags.into_iter().map(|t| (t.key, t.value)).collect(),
            },
        );
        Ok(())
    }

    async fn update_document(&self, request: UpdateDocumentRequest) -> Result<String, RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::UpdateDocument(request.clone()))?;
        if request.version != LATEST_VERSION {
            return Err(RegistryError::service(
                "InvalidDocumentVersion",
                format!("only {LATEST_VERSION} can be updated"),
            ));
        }
        let doc = state.document_mut(&request.name)?;
        let hash = content_hash(&request.content);
        if doc.active().hash == hash {
            return Err(RegistryError::DuplicateContent);
        }
        doc.format = request.format;
        doc.versions.push(StoredVersion {
            content: request.content,
            hash,
        });
        Ok(doc.versions.len().to_string())
    }

    async fn update_default_version(&self, name: &str, version: &str) -> Result<(), RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::UpdateDefaultVersion {
            name: name.to_string(),
            version: version.to_string(),
        })?;
        let doc = state.document_mut(name)?;
        match version.parse::<usize>() {
            Ok(v) if (1..=doc.versions.len()).contains(&v) => {
                doc.default_version = v;
                Ok(())
            }
            _ => Err(RegistryError::service(
                "InvalidDocumentVersion",
                format!("version {version} does not exist for {name}"),
            )),
        }
    }

    async fn describe_permission(
        &self,
        name: &str,
        _permission_type: PermissionType,
    ) -> Result<Vec<String>, RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::DescribePermission {
            name: name.to_string(),
        })?;
        Ok(state.document_mut(name)?.shared_with.clone())
    }

    async fn modify_permission(&self, request: ModifyPermissionRequest) -> Result<(), RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::ModifyPermission(request.clone()))?;
        let doc = state.document_mut(&request.name)?;
        for id in request.account_ids_to_add {
            if !doc.shared_with.contains(&id) {
                doc.shared_with.push(id);
            }
        }
        doc.shared_with
            .retain(|id| !request.account_ids_to_remove.contains(id));
        Ok(())
    }

    async fn list_tags(
        &self,
        resource_id: &str,
        _resource_type: ResourceType,
    ) -> Result<Vec<Tag>, RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::ListTags {
            resource_id: resource_id.to_string(),
        })?;
        Ok(state
            .document_mut(resource_id)?
            .tags
            .iter()
            .map(|(k, v)| Tag::new(k, v))
            .collect())
    }

    async fn add_tags(
        &self,
        resource_id: &str,
        _resource_type: ResourceType,
        tags: Vec<Tag>,
    ) -> Result<(), RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::AddTags {
            resource_id: resource_id.to_string(),
            tags: tags.clone(),
        })?;
        let doc = state.document_mut(resource_id)?;
        doc.tags.extend(tags.into_iter().map(|t| (t.key, t.value)));
        Ok(())
    }

    async fn remove_tags(
        &self,
        resource_id: &str,
        _resource_type: ResourceType,
        keys: Vec<String>,
    ) -> Result<(), RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::RemoveTags {
            resource_id: resource_id.to_string(),
            keys: keys.clone(),
        })?;
        let doc = state.document_mut(resource_id)?;
        for key in keys {
            doc.tags.remove(&key);
        }
        Ok(())
    }

    async fn delete_document(&self, name: &str) -> Result<(), RegistryError> {
        let _flight = self.enter().await;
        let mut state = self.lock();
        state.record(Call::DeleteDocument {
            name: name.to_string(),
        })?;
        if !state.document_mut(name)?.shared_with.is_empty() {
            return Err(RegistryError::service(
                "InvalidDocumentOperation",
                format!("document {name} is shared; remove all permissions before deleting"),
            ));
        }
        state.documents.remove(name);
        Ok(())
    }

    async fn caller_account_id(&self) -> Result<Option<String>, RegistryError> {
        Ok(self.account_id.clone())
    }
}
