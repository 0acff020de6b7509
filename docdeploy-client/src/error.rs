use thiserror::Error;

/// Errors raised while constructing an [`HttpRegistry`](crate::HttpRegistry).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid registry endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
