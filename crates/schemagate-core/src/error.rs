use thiserror::Error;

/// Core error type shared across schemagate crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema document cannot be compiled.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A JSON document could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by schemagate crates.
pub type Result<T> = std::result::Result<T, Error>;
