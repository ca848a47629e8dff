use thiserror::Error;

/// Message fragments that mark a failure as transient.
///
/// Matched case-insensitively against the rendered error message.
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "fetch",
    "429",
    "rate limit",
    "too many",
    "500",
    "502",
    "503",
];

/// Custom error type for plotweave operations.
#[derive(Debug, Error)]
pub enum PlotweaveError {
    /// The text-generation provider failed or returned a failure envelope.
    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    /// Provider output could not be parsed into the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested entity was not found.
    #[error("Not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Persistence layer failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Graph algorithm failed on the relationship network.
    #[error("Graph error: {0}")]
    Graph(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled an in-flight operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl PlotweaveError {
    /// Provider failure whose retryability is decided by its message.
    pub fn provider(message: impl Into<String>) -> Self {
        PlotweaveError::Provider {
            message: message.into(),
            retryable: false,
        }
    }

    /// Provider failure that is always worth retrying.
    pub fn transient(message: impl Into<String>) -> Self {
        PlotweaveError::Provider {
            message: message.into(),
            retryable: true,
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Parse, validation and cancellation errors are never retryable: running the
    /// same request again cannot fix them.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlotweaveError::Provider { retryable: true, .. } => true,
            PlotweaveError::Provider { message, .. } => message_is_transient(message),
            PlotweaveError::Storage(message) => message_is_transient(message),
            _ => false,
        }
    }
}

/// Classify a raw error message as transient (timeouts, network, 429, 5xx).
pub fn message_is_transient(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl From<serde_json::Error> for PlotweaveError {
    fn from(err: serde_json::Error) -> Self {
        PlotweaveError::Parse(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for PlotweaveError {
    fn from(err: std::io::Error) -> Self {
        PlotweaveError::Storage(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for PlotweaveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlotweaveError::transient(format!("timeout: {}", err))
        } else if err.is_connect() || err.is_request() {
            PlotweaveError::transient(format!("network error: {}", err))
        } else if err.is_decode() {
            PlotweaveError::Parse(format!("invalid provider response body: {}", err))
        } else {
            PlotweaveError::provider(err.to_string())
        }
    }
}
