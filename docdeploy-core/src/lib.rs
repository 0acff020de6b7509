//! docdeploy core library: descriptor types, configuration loading, errors.
//!
//! - [`types`]: [`Document`] and the raw [`DocumentConfig`] it is built from
//! - [`loader`]: directory walk, env interpolation, YAML/JSON decoding
//! - [`dotenv`]: `.env` support
//! - [`error`]: [`LoadError`]

pub mod dotenv;
pub mod error;
pub mod loader;
pub mod types;

pub use error::LoadError;
pub use loader::{load_documents, ConfigParser, LoadOptions};
pub use types::{
    Content, ContentSource, Document, DocumentConfig, DocumentFormat, DocumentName, MainStep,
    Parameter,
};
