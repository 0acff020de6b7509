//! # docdeploy-client
//!
//! HTTP implementation of [`DocumentRegistry`](docdeploy_sync::DocumentRegistry)
//! speaking the SSM JSON 1.1 protocol.

pub mod client;
mod error;
pub mod protocol;

pub use client::{default_endpoint, ClientConfig, HttpRegistry, DEFAULT_REGION};
pub use error::ClientError;
