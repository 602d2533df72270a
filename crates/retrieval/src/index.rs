//! SQLite-backed vector index for one domain's documents.

use crate::types::Document;
use chrono::{DateTime, Utc};
use lexrag_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// A document ready to be stored, with its embedding.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// Content hash; identical documents share an id
    pub id: String,

    /// The document itself
    pub document: Document,

    /// Embedding vector
    pub embedding: Vec<f32>,

    /// File the document was read from
    pub source: Option<String>,

    /// When the document was stored
    pub indexed_at: DateTime<Utc>,
}

/// Initialize the SQLite index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Retrieval(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Retrieval(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL,
            embedding BLOB NOT NULL,
            source TEXT,
            indexed_at TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Stable id for a document: SHA-256 over content and sorted metadata.
pub fn document_id(document: &Document) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.content.as_bytes());
    for (key, value) in &document.metadata {
        hasher.update([0u8]);
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Insert or replace a document.
pub fn insert_document(conn: &Connection, entry: &IndexedDocument) -> AppResult<()> {
    let metadata_json = serde_json::to_string(&entry.document.metadata)
        .map_err(|e| AppError::Retrieval(format!("Failed to serialize metadata: {}", e)))?;

    conn.execute(
        "INSERT OR REPLACE INTO documents (id, content, metadata, embedding, source, indexed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id,
            entry.document.content,
            metadata_json,
            embedding_to_bytes(&entry.embedding),
            entry.source,
            entry.indexed_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to insert document: {}", e)))?;

    Ok(())
}

/// Query the index for the top-k most similar documents.
///
/// Ties keep insertion order, so ranking is deterministic.
pub fn query_documents(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<(Document, f32)>> {
    let mut stmt = conn
        .prepare("SELECT content, metadata, embedding FROM documents ORDER BY rowid")
        .map_err(|e| AppError::Retrieval(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let content: String = row.get(0)?;
            let metadata_json: String = row.get(1)?;
            let embedding_bytes: Vec<u8> = row.get(2)?;
            Ok((content, metadata_json, embedding_bytes))
        })
        .map_err(|e| AppError::Retrieval(format!("Failed to query documents: {}", e)))?;

    let mut results = Vec::new();
    for row in rows {
        let (content, metadata_json, embedding_bytes) =
            row.map_err(|e| AppError::Retrieval(format!("Failed to read document row: {}", e)))?;

        let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_json)
            .map_err(|e| AppError::Retrieval(format!("Corrupt document metadata: {}", e)))?;
        let embedding = bytes_to_embedding(&embedding_bytes)?;

        let score = cosine_similarity(query_embedding, &embedding);
        results.push((Document { content, metadata }, score));
    }

    // Stable sort keeps rowid order among equal scores
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);

    tracing::debug!(
        "Retrieved {} documents (requested top-{})",
        results.len(),
        top_k
    );

    Ok(results)
}

/// Number of stored documents.
pub fn count_documents(conn: &Connection) -> AppResult<u32> {
    conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
        row.get::<_, i64>(0).map(|v| v as u32)
    })
    .map_err(|e| AppError::Retrieval(format!("Failed to count documents: {}", e)))
}

/// Most recent `indexed_at`, if any document exists.
pub fn last_indexed_at(conn: &Connection) -> AppResult<Option<DateTime<Utc>>> {
    let latest: Option<String> = conn
        .query_row("SELECT MAX(indexed_at) FROM documents", [], |row| row.get(0))
        .optional()
        .map_err(|e| AppError::Retrieval(format!("Failed to read index time: {}", e)))?
        .flatten();

    latest
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| AppError::Retrieval(format!("Corrupt index timestamp: {}", e)))
        })
        .transpose()
}

/// Reset the index (delete all documents).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM documents", [])
        .map_err(|e| AppError::Retrieval(format!("Failed to delete documents: {}", e)))?;

    tracing::info!("Reset document index");
    Ok(())
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Retrieval(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
