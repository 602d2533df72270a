//! `DocumentRetriever` backed by a per-domain SQLite index.

use crate::embeddings::{ollama, EmbeddingProvider};
use crate::index;
use crate::retriever::{DocumentRetriever, RetrieverTable};
use crate::types::{Document, IndexStats};
use lexrag_core::{AppConfig, AppError, AppResult, Domain};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Attempts per retrieval unless configured otherwise.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial backoff between retrieval attempts; doubled after every failure.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Retriever over one domain's SQLite index.
pub struct IndexRetriever {
    domain: Domain,
    db_path: PathBuf,
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    attempt_timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl IndexRetriever {
    /// Open (creating if needed) the index at `db_path`.
    ///
    /// `attempt_timeout` bounds each attempt, not the whole call.
    pub fn open(
        db_path: &Path,
        domain: Domain,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        attempt_timeout: Duration,
    ) -> AppResult<Self> {
        let conn = index::init_index(db_path)?;

        Ok(Self {
            domain,
            db_path: db_path.to_path_buf(),
            conn: Arc::new(Mutex::new(conn)),
            embedder,
            top_k,
            attempt_timeout,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the retry budget and initial backoff.
    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// Domain this retriever serves.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Index statistics.
    pub fn stats(&self) -> AppResult<IndexStats> {
        let (documents_count, last_indexed_at) = {
            let conn = lock(&self.conn, self.domain)?;
            (
                index::count_documents(&conn)?,
                index::last_indexed_at(&conn)?,
            )
        };

        let db_size_bytes = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(IndexStats {
            domain: self.domain,
            documents_count,
            db_size_bytes,
            last_indexed_at,
        })
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Document>> {
        let embedding = self.embedder.embed(query).await?;

        // The cosine scan is CPU and disk bound
        let conn = Arc::clone(&self.conn);
        let domain = self.domain;
        let top_k = self.top_k;
        let results = tokio::task::spawn_blocking(move || {
            let conn = lock(&conn, domain)?;
            index::query_documents(&conn, &embedding, top_k)
        })
        .await
        .map_err(|e| AppError::Retrieval(format!("{} index scan failed: {}", domain, e)))??;

        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn attempt(&self, query: &str) -> AppResult<Vec<Document>> {
        tokio::time::timeout(self.attempt_timeout, self.search(query))
            .await
            .map_err(|_| AppError::Timeout {
                operation: format!("{} retrieval", self.domain),
                elapsed: self.attempt_timeout,
            })?
    }
}

fn lock(conn: &Mutex<Connection>, domain: Domain) -> AppResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| AppError::Retrieval(format!("{} index lock poisoned", domain)))
}

#[async_trait::async_trait]
impl DocumentRetriever for IndexRetriever {
    async fn retrieve(&self, query: &str) -> AppResult<Vec<Document>> {
        let start = Instant::now();

        let mut attempt = 0;
        let documents = loop {
            attempt += 1;
            match self.attempt(query).await {
                Ok(documents) => break documents,
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                    warn!(
                        "{} retrieval failed (attempt {}/{}), retrying in {}ms: {}",
                        self.domain,
                        attempt,
                        self.max_retries,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        };

        debug!(
            domain = %self.domain,
            documents = documents.len(),
            attempt,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieved documents"
        );

        Ok(documents)
    }
}

/// Open every domain index named by `config` and bind it in a table.
///
/// Each retrieval attempt may spend the embedder's whole retry budget, so
/// the embedder's own retries stay reachable.
pub fn open_table(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> AppResult<RetrieverTable> {
    let attempt_timeout =
        ollama::retry_budget(Duration::from_secs(config.embeddings.timeout_secs));
    let mut table = RetrieverTable::new();

    for domain in Domain::ALL {
        let path = config.index_path(domain);
        let retriever = IndexRetriever::open(
            &path,
            domain,
            Arc::clone(&embedder),
            config.retrieval.top_k,
            attempt_timeout,
        )?
        .with_retries(
            config.retrieval.max_retries,
            Duration::from_millis(INITIAL_BACKOFF_MS),
        );

        if retriever.stats()?.documents_count == 0 {
            warn!("Index for {} is empty: {:?}", domain, path);
        }

        table = table.bind(domain, Arc::new(retriever));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::hashing::HashingEmbeddings;
    use crate::index::{document_id, insert_document, IndexedDocument};
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    async fn seed(path: &Path, embedder: &HashingEmbeddings, texts: &[&str]) {
        let conn = index::init_index(path).unwrap();
        for text in texts {
            let document = Document::new(*text);
            insert_document(
                &conn,
                &IndexedDocument {
                    id: document_id(&document),
                    embedding: embedder.embed(text).await.unwrap(),
                    document,
                    source: None,
                    indexed_at: Utc::now(),
                },
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_retrieve_top_k() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("inheritance.sqlite");
        let embedder = HashingEmbeddings::new(128);
        seed(
            &path,
            &embedder,
            &[
                "Forced heirship reserves a share of the estate for children",
                "Spousal maintenance after divorce",
                "Holographic wills must be handwritten",
            ],
        )
        .await;

        let retriever = IndexRetriever::open(
            &path,
            Domain::Inheritance,
            Arc::new(HashingEmbeddings::new(128)),
            2,
            Duration::from_secs(5),
        )
        .unwrap();

        let docs = retriever.retrieve("forced heirship share").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].content.starts_with("Forced heirship"));

        let stats = retriever.stats().unwrap();
        assert_eq!(stats.domain, Domain::Inheritance);
        assert_eq!(stats.documents_count, 3);
        assert!(stats.db_size_bytes > 0);
    }

    /// Hashing embedder whose first `slow_calls` calls stall for `delay`,
    /// or which always fails with `fail_with` when set.
    #[derive(Debug)]
    struct StallingEmbedder {
        inner: HashingEmbeddings,
        calls: AtomicU32,
        slow_calls: u32,
        delay: Duration,
        fail_with: Option<fn() -> AppError>,
    }

    impl StallingEmbedder {
        fn new(slow_calls: u32, delay: Duration) -> Self {
            Self {
                inner: HashingEmbeddings::new(64),
                calls: AtomicU32::new(0),
                slow_calls,
                delay,
                fail_with: None,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for StallingEmbedder {
        fn provider_name(&self) -> &str {
            "stalling"
        }

        fn model_name(&self) -> &str {
            "hashing"
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            if call <= self.slow_calls {
                tokio::time::sleep(self.delay).await;
            }
            self.inner.embed_batch(texts).await
        }
    }

    async fn seeded_retriever(
        temp: &TempDir,
        embedder: Arc<StallingEmbedder>,
        attempt_timeout: Duration,
    ) -> IndexRetriever {
        let path = temp.path().join("inheritance.sqlite");
        seed(
            &path,
            &HashingEmbeddings::new(64),
            &["Forced heirship reserves a share of the estate for children"],
        )
        .await;

        IndexRetriever::open(&path, Domain::Inheritance, embedder, 4, attempt_timeout)
            .unwrap()
            .with_retries(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_timed_out_attempt_is_retried() {
        let temp = TempDir::new().unwrap();
        let embedder = Arc::new(StallingEmbedder::new(1, Duration::from_millis(300)));
        let retriever =
            seeded_retriever(&temp, embedder.clone(), Duration::from_millis(100)).await;

        let docs = retriever.retrieve("forced heirship").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let temp = TempDir::new().unwrap();
        let embedder = Arc::new(StallingEmbedder::new(10, Duration::from_millis(200)));
        let retriever =
            seeded_retriever(&temp, embedder.clone(), Duration::from_millis(20)).await;

        let err = retriever.retrieve("forced heirship").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { .. }));
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let temp = TempDir::new().unwrap();
        let mut embedder = StallingEmbedder::new(0, Duration::ZERO);
        embedder.fail_with = Some(|| AppError::ProviderStatus {
            service: "Ollama embeddings".to_string(),
            status: 404,
            message: "model not found".to_string(),
        });
        let embedder = Arc::new(embedder);
        let retriever = seeded_retriever(&temp, embedder.clone(), Duration::from_secs(5)).await;

        let err = retriever.retrieve("forced heirship").await.unwrap_err();
        assert!(matches!(err, AppError::ProviderStatus { status: 404, .. }));
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_retrievals_share_the_index() {
        let temp = TempDir::new().unwrap();
        let embedder = Arc::new(StallingEmbedder::new(0, Duration::ZERO));
        let retriever =
            Arc::new(seeded_retriever(&temp, embedder.clone(), Duration::from_secs(5)).await);

        let queries = ["heirship", "estate share", "children", "will", "legitimate"];
        let results = futures::future::try_join_all(
            queries.iter().map(|q| {
                let retriever = Arc::clone(&retriever);
                async move { retriever.retrieve(q).await }
            }),
        )
        .await
        .unwrap();

        assert!(results.iter().all(|docs| docs.len() == 1));
        assert_eq!(embedder.calls(), queries.len() as u32);
    }

    #[tokio::test]
    async fn test_open_table_binds_every_domain() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };

        let table = open_table(&config, Arc::new(HashingEmbeddings::new(32))).unwrap();
        assert!(table.is_complete());
        assert!(config.index_path(Domain::Divorce).exists());

        let docs = table
            .get(Domain::Divorce)
            .unwrap()
            .retrieve("alimony")
            .await
            .unwrap();
        assert!(docs.is_empty());
    }
}
