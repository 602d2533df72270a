//! Load law documents from a folder into a domain index.

use crate::embeddings::EmbeddingProvider;
use crate::index::{self, IndexedDocument};
use crate::types::{Document, RawDocument};
use chrono::Utc;
use lexrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// Texts embedded per provider call.
const EMBED_BATCH_SIZE: usize = 32;

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// `*.json` files found
    pub files_seen: usize,

    /// Documents written to the index
    pub documents_indexed: usize,

    /// Files skipped (unreadable, invalid JSON or empty content)
    pub skipped: usize,

    /// Wall time in seconds
    pub duration_secs: f64,
}

/// Ingest every `*.json` file directly inside `folder` into the index at
/// `db_path`. Subdirectories are not visited.
///
/// Each file holds one `{content, metadata}` object. Documents are keyed by
/// content hash, so re-ingesting the same folder leaves the index unchanged.
pub async fn ingest_folder(
    db_path: &Path,
    embedder: &dyn EmbeddingProvider,
    folder: &Path,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    if !folder.is_dir() {
        return Err(AppError::Config(format!(
            "Document folder does not exist: {:?}",
            folder
        )));
    }

    let mut stats = IngestStats::default();
    let mut pending: Vec<(Document, String)> = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        stats.files_seen += 1;

        match read_document(path) {
            Ok(document) if document.content.trim().is_empty() => {
                tracing::warn!("Skipping {:?}: empty content", path);
                stats.skipped += 1;
            }
            Ok(document) => pending.push((document, path.display().to_string())),
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                stats.skipped += 1;
            }
        }
    }

    let mut entries = Vec::with_capacity(pending.len());
    for batch in pending.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|(doc, _)| doc.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::Retrieval(format!(
                "Embedding provider returned {} vectors for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }

        for ((document, source), embedding) in batch.iter().zip(embeddings) {
            entries.push(IndexedDocument {
                id: index::document_id(document),
                document: document.clone(),
                embedding,
                source: Some(source.clone()),
                indexed_at: Utc::now(),
            });
        }
    }

    let mut conn = index::init_index(db_path)?;
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Retrieval(format!("Failed to begin transaction: {}", e)))?;
    for entry in &entries {
        index::insert_document(&tx, entry)?;
    }
    tx.commit()
        .map_err(|e| AppError::Retrieval(format!("Failed to commit documents: {}", e)))?;

    stats.documents_indexed = entries.len();
    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Ingested {} documents from {:?} ({} files, {} skipped) in {:.2}s",
        stats.documents_indexed,
        folder,
        stats.files_seen,
        stats.skipped,
        stats.duration_secs
    );

    Ok(stats)
}

fn read_document(path: &Path) -> AppResult<Document> {
    let text = std::fs::read_to_string(path)?;
    let raw: RawDocument = serde_json::from_str(&text)?;
    Ok(raw.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::hashing::HashingEmbeddings;
    use std::fs;
    use tempfile::TempDir;

    fn write_corpus(dir: &Path) {
        fs::write(
            dir.join("art_536.json"),
            r#"{"content": "Art. 536: the legitimate heirs are the spouse and the children.", "metadata": {"article": 536}}"#,
        )
        .unwrap();
        fs::write(
            dir.join("art_457.json"),
            r#"{"content": "Art. 457: inheritance passes by law or by will.", "metadata": {"article": 457}}"#,
        )
        .unwrap();
        fs::write(dir.join("broken.json"), "{not json").unwrap();
        fs::write(dir.join("empty.json"), r#"{"metadata": {}}"#).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
    }

    #[tokio::test]
    async fn test_ingest_folder() {
        let temp = TempDir::new().unwrap();
        let corpus = temp.path().join("laws/inheritance");
        fs::create_dir_all(&corpus).unwrap();
        write_corpus(&corpus);

        let db_path = temp.path().join("index/inheritance.sqlite");
        let embedder = HashingEmbeddings::new(64);
        let stats = ingest_folder(&db_path, &embedder, &corpus).await.unwrap();

        assert_eq!(stats.files_seen, 4);
        assert_eq!(stats.documents_indexed, 2);
        assert_eq!(stats.skipped, 2);

        let conn = index::init_index(&db_path).unwrap();
        assert_eq!(index::count_documents(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_subdirectories_are_not_ingested() {
        let temp = TempDir::new().unwrap();
        write_corpus(temp.path());
        let nested = temp.path().join("repealed");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            nested.join("art_999.json"),
            r#"{"content": "Art. 999: repealed.", "metadata": {}}"#,
        )
        .unwrap();

        let db_path = temp.path().join("idx.sqlite");
        let embedder = HashingEmbeddings::new(64);
        let stats = ingest_folder(&db_path, &embedder, temp.path()).await.unwrap();

        assert_eq!(stats.files_seen, 4);
        assert_eq!(stats.documents_indexed, 2);
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let temp = TempDir::new().unwrap();
        write_corpus(temp.path());
        let db_path = temp.path().join("idx.sqlite");
        let embedder = HashingEmbeddings::new(64);

        ingest_folder(&db_path, &embedder, temp.path()).await.unwrap();
        ingest_folder(&db_path, &embedder, temp.path()).await.unwrap();

        let conn = index::init_index(&db_path).unwrap();
        assert_eq!(index::count_documents(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let temp = TempDir::new().unwrap();
        let embedder = HashingEmbeddings::new(8);
        let result = ingest_folder(
            &temp.path().join("idx.sqlite"),
            &embedder,
            &temp.path().join("nope"),
        )
        .await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
