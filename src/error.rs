//! Error types for the vectorization worker.

use thiserror::Error;

/// Determines if an error is worth retrying on a later cycle.
///
/// Nothing in the pipeline aborts on a retryable error; the classification
/// feeds log context so operators can tell transient store hiccups from
/// permanently malformed documents.
pub trait Retryable {
    /// Returns true if the operation may succeed if attempted again.
    fn is_retryable(&self) -> bool;
}

/// Errors related to day-granularity date handling.
#[derive(Debug, Error)]
pub enum DateError {
    #[error("invalid date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl Retryable for DateError {
    fn is_retryable(&self) -> bool {
        // A date string does not get better on retry.
        false
    }
}

/// Errors related to the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("failed to connect to document store: {0}")]
    ConnectionError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("update error: {0}")]
    UpdateError(String),

    #[error("malformed row: {0}")]
    RowError(String),
}

impl Retryable for DocumentStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            DocumentStoreError::ConnectionError(_) => true,
            DocumentStoreError::QueryError(msg) | DocumentStoreError::UpdateError(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout") || msg.contains("connection") || msg.contains("unavailable")
            }
            DocumentStoreError::RowError(_) => false,
        }
    }
}

/// Errors related to the vector store.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) => true,
            VectorStoreError::CollectionError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::SearchError(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout")
                    || msg.contains("connection")
                    || msg.contains("unavailable")
                    || msg.contains("too many")
            }
        }
    }
}

/// Errors related to the embedding server.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Failure of one document inside a batch. Isolated to that document; the
/// status flag stays unset so the document is retried on a later cycle.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("document has no url")]
    MissingUrl,

    #[error("date error: {0}")]
    Date(#[from] DateError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
}

impl Retryable for ProcessError {
    fn is_retryable(&self) -> bool {
        match self {
            ProcessError::MissingUrl => false,
            ProcessError::Date(e) => e.is_retryable(),
            ProcessError::Embedding(e) => e.is_retryable(),
            ProcessError::VectorStore(e) => e.is_retryable(),
            ProcessError::DocumentStore(e) => e.is_retryable(),
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
