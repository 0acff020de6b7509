//! Content resolution: [`FileKind`] classification and [`resolve`].
//!
//! # Extension mapping
//!
//! | Extension        | Format | Payload                          |
//! |------------------|--------|----------------------------------|
//! | `.txt`           | TEXT   | raw file                         |
//! | `.yml`, `.yaml`  | YAML   | raw file                         |
//! | `.json`          | JSON   | raw file                         |
//! | `.sh`            | JSON   | generated `aws:runShellScript`   |
//!
//! Matching is case-insensitive. Anything else is rejected.

use std::fs;
use std::path::Path;

use docdeploy_core::{Content, ContentSource, Document, DocumentFormat};

use crate::error::{read_err, ContentError};
use crate::shell;

/// Final `(format, payload)` submitted to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub format: DocumentFormat,
    pub payload: String,
}

/// What a referenced file turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Submitted verbatim in the given format.
    Raw(DocumentFormat),
    /// Wrapped as a shell document.
    ShellScript,
}

impl FileKind {
    /// Classify `path` by its extension.
    pub fn classify(path: &Path) -> Result<Self, ContentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(Self::Raw(DocumentFormat::Text)),
            "yml" | "yaml" => Ok(Self::Raw(DocumentFormat::Yaml)),
            "json" => Ok(Self::Raw(DocumentFormat::Json)),
            "sh" => Ok(Self::ShellScript),
            _ => Err(ContentError::UnsupportedExtension {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Produce the payload for `document` from its classified content source.
pub fn resolve(document: &Document) -> Result<ResolvedContent, ContentError> {
    match &document.content {
        Some(ContentSource::ShellScript(path)) => resolve_shell(document, path),
        Some(ContentSource::Inline(content)) => resolve_inline(content),
        Some(ContentSource::File(path)) => match FileKind::classify(path)? {
            FileKind::ShellScript => resolve_shell(document, path),
            FileKind::Raw(format) => {
                let payload = fs::read_to_string(path).map_err(|e| read_err(path, e))?;
                tracing::debug!("[{}] loaded {format} content from {}", document.name, path.display());
                Ok(ResolvedContent { format, payload })
            }
        },
        None => Err(ContentError::NoContent),
    }
}

fn resolve_shell(document: &Document, script_path: &Path) -> Result<ResolvedContent, ContentError> {
    let script = fs::read_to_string(script_path).map_err(|e| read_err(script_path, e))?;
    let content = shell::wrap_script(document, &script)?;
    resolve_inline(&content)
}

fn resolve_inline(content: &Content) -> Result<ResolvedContent, ContentError> {
    Ok(ResolvedContent {
        format: DocumentFormat::Json,
        payload: serde_json::to_string(content)?,
    })
}
