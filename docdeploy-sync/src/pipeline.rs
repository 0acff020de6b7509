//! Deploy and remove entry points shared by the CLI and tests.

use std::sync::Arc;

use docdeploy_core::Document;

use crate::batch::{run_batch, BatchOptions, BatchSummary, Operation};
use crate::error::BatchError;
use crate::reconcile::{deploy_document, remove_document};
use crate::registry::DocumentRegistry;

/// Deploy every document in bounded parallel chunks.
pub async fn deploy<R>(
    registry: Arc<R>,
    documents: Vec<Document>,
    options: &BatchOptions,
) -> Result<BatchSummary, BatchError>
where
    R: DocumentRegistry + 'static,
{
    run_batch(documents, options, Operation::Deploy, move |document| {
        let registry = Arc::clone(&registry);
        async move { deploy_document(registry.as_ref(), &document).await }
    })
    .await
}

/// Remove every document in bounded parallel chunks.
pub async fn remove<R>(
    registry: Arc<R>,
    documents: Vec<Document>,
    options: &BatchOptions,
) -> Result<BatchSummary, BatchError>
where
    R: DocumentRegistry + 'static,
{
    run_batch(documents, options, Operation::Remove, move |document| {
        let registry = Arc::clone(&registry);
        async move { remove_document(registry.as_ref(), &document).await }
    })
    .await
}
