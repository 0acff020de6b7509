//! Chunked, bounded fan-out of per-document work.
//!
//! Documents are split into contiguous chunks of at most `parallels`. Every
//! document in a chunk runs as its own tokio task; the chunk is a barrier and
//! the next one starts only after its slowest task finishes (plus
//! `chunk_pause`). Each task reports exactly one outcome over an mpsc channel
//! sized to the whole batch, so no send ever waits on the collector.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use docdeploy_core::Document;

use crate::error::BatchError;

/// Default number of documents reconciled at once.
pub const DEFAULT_PARALLELS: usize = 5;

/// Default pause between chunks.
pub const DEFAULT_CHUNK_PAUSE: Duration = Duration::from_secs(2);

/// What a batch does to each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deploy,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deploy => write!(f, "deploy"),
            Operation::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Chunk size; must be at least 1.
    pub parallels: usize,
    pub chunk_pause: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallels: DEFAULT_PARALLELS,
            chunk_pause: DEFAULT_CHUNK_PAUSE,
        }
    }
}

impl BatchOptions {
    pub fn with_parallels(mut self, parallels: usize) -> Self {
        self.parallels = parallels;
        self
    }

    pub fn with_chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause = pause;
        self
    }
}

/// Result of a batch in which every document succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub operation: Operation,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Chunk barriers waited on; `ceil(total / parallels)`.
    pub chunks: usize,
}

/// One document's outcome as seen by the collector.
#[derive(Debug)]
struct Report {
    document: String,
    error: Option<String>,
}

/// Run `work` once per document, at most `options.parallels` at a time.
///
/// Never stops early: every document yields exactly one outcome. Failures are
/// logged individually and reported in aggregate through
/// [`BatchError::Failed`].
pub async fn run_batch<F, Fut, T, E>(
    documents: Vec<Document>,
    options: &BatchOptions,
    operation: Operation,
    work: F,
) -> Result<BatchSummary, BatchError>
where
    F: Fn(Arc<Document>) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: fmt::Debug + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    if options.parallels == 0 {
        return Err(BatchError::InvalidParallelism(options.parallels));
    }

    let total = documents.len();
    let documents: Vec<Arc<Document>> = documents.into_iter().map(Arc::new).collect();
    let chunk_count = total.div_ceil(options.parallels);
    let (tx, mut rx) = mpsc::channel::<Report>(total.max(1));

    info!(%operation, total, parallels = options.parallels, chunks = chunk_count, "starting batch");

    for (index, chunk) in documents.chunks(options.parallels).enumerate() {
        debug!(chunk = index + 1, of = chunk_count, size = chunk.len(), "running chunk");
        warn_on_duplicate_names(chunk);

        let mut handles = Vec::with_capacity(chunk.len());
        for document in chunk {
            let name = document.name.to_string();
            let fut = work(Arc::clone(document));
            let tx = tx.clone();
            let task_name = name.clone();
            let handle = tokio::spawn(async move {
                let error = match fut.await {
                    Ok(outcome) => {
                        debug!(document = %task_name, ?outcome, "document reconciled");
                        None
                    }
                    Err(err) => Some(err.to_string()),
                };
                let _ = tx
                    .send(Report {
                        document: task_name,
                        error,
                    })
                    .await;
            });
            handles.push((name, handle));
        }

        for (name, handle) in handles {
            if let Err(join_err) = handle.await {
                let _ = tx
                    .send(Report {
                        error: Some(format!("[{name}] task aborted: {join_err}")),
                        document: name,
                    })
                    .await;
            }
        }

        if index + 1 < chunk_count && !options.chunk_pause.is_zero() {
            tokio::time::sleep(options.chunk_pause).await;
        }
    }
    drop(tx);

    let mut succeeded = 0;
    let mut failed = 0;
    while let Some(report) = rx.recv().await {
        match report.error {
            None => succeeded += 1,
            Some(message) => {
                failed += 1;
                error!(document = %report.document, "{message}");
            }
        }
    }

    if failed > 0 {
        return Err(BatchError::Failed {
            failed,
            total,
            operation,
        });
    }

    info!(%operation, total, "batch completed");
    Ok(BatchSummary {
        operation,
        total,
        succeeded,
        failed,
        chunks: chunk_count,
    })
}

fn warn_on_duplicate_names(chunk: &[Arc<Document>]) {
    let mut seen = HashSet::new();
    for document in chunk {
        if !seen.insert(document.name.as_str()) {
            warn!(
                document = %document.name,
                "document appears more than once in the same chunk; concurrent calls may race"
            );
        }
    }
}
