mod document_store;
mod duplicates;
mod embedding;
mod supervisor;
mod vector_store;

pub use document_store::{DocumentStore, PostgresDocumentStore};
pub use duplicates::{DateWindow, DuplicateDetector};
pub use embedding::{Embedder, HttpEmbeddingClient};
pub use supervisor::{BackoffPolicy, ConnectionState, ConnectionSupervisor};
pub use vector_store::{QdrantVectorStore, VectorIndex};
