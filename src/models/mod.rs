mod config;
mod document;

pub use config::{
    BackoffConfig, BackoffStrategy, Config, DEFAULT_COLLECTION, DEFAULT_DOCUMENT_STORE_URL,
    DEFAULT_EMBEDDING_URL, DEFAULT_QDRANT_URL, DEFAULT_STATUS_FIELD, DEFAULT_TABLE,
    DocumentStoreConfig, DuplicateConfig, EmbeddingConfig, LogConfig, VectorStoreConfig,
    WorkerConfig,
};
pub use document::{
    DEFAULT_TITLE, DuplicateCandidate, NewsDocument, PublishDate, RecordMetadata, ScoredRecord,
    TaskStatus,
};
