use thiserror::Error;

/// Failures while converting markup into a structured value.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed markup at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("unexpected content outside the root element")]
    TrailingContent,
    /// The parsed document failed inline schema validation.
    #[error("{0}")]
    Invalid(String),
}

/// Failures reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("transport error: {0}")]
    Other(String),
}

/// Failures of a single read.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Usage errors raised at the call site of a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a \"url\" property or function must be specified")]
    MissingUrl,
    /// Reads run on tokio; the caller is not inside a runtime.
    #[error("no tokio runtime available to run the read")]
    NoRuntime,
}
