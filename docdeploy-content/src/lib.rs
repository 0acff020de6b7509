//! # docdeploy-content
//!
//! Derives the final `(format, payload)` pair for a [`Document`] from its
//! classified content source: inline structured content, a plain file, or a
//! shell script wrapped into a one-step command document.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docdeploy_core::{ContentSource, Document};
//! use docdeploy_content::resolve;
//!
//! let doc = Document::new("demo").with_content(ContentSource::File("script.sh".into()));
//! if let Ok(resolved) = resolve(&doc) {
//!     println!("{}: {} bytes", resolved.format, resolved.payload.len());
//! }
//! ```
//!
//! [`Document`]: docdeploy_core::Document

pub mod error;
pub mod resolver;
pub mod shell;

pub use error::ContentError;
pub use resolver::{resolve, FileKind, ResolvedContent};
