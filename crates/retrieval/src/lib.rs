//! Per-domain document retrieval.
//!
//! Each legal domain owns a SQLite index of law documents with embeddings.
//! The pipeline only sees the `DocumentRetriever` trait and the
//! `RetrieverTable` binding each domain to its retriever.

pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod retriever;
pub mod sqlite;
pub mod types;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use ingest::{ingest_folder, IngestStats};
pub use retriever::{DocumentRetriever, RetrieverTable};
pub use sqlite::{open_table, IndexRetriever};
pub use types::{Document, IndexStats};
