//! Retriever seam and the domain binding table.

use crate::types::Document;
use lexrag_core::{AppError, AppResult, Domain};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Similarity search over one domain's documents.
#[async_trait::async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Return documents for `query`, most relevant first.
    async fn retrieve(&self, query: &str) -> AppResult<Vec<Document>>;
}

/// Domain → retriever bindings.
///
/// Built once at startup; read-only afterwards and cheap to share.
#[derive(Clone, Default)]
pub struct RetrieverTable {
    bindings: BTreeMap<Domain, Arc<dyn DocumentRetriever>>,
}

impl RetrieverTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `domain` to `retriever`, replacing any earlier binding.
    pub fn bind(mut self, domain: Domain, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.bindings.insert(domain, retriever);
        self
    }

    /// Retriever bound to `domain`.
    pub fn get(&self, domain: Domain) -> Option<Arc<dyn DocumentRetriever>> {
        self.bindings.get(&domain).cloned()
    }

    /// Whether every domain has a retriever.
    pub fn is_complete(&self) -> bool {
        Domain::ALL.iter().all(|d| self.bindings.contains_key(d))
    }

    /// Fail unless every domain has a retriever.
    pub fn ensure_complete(&self) -> AppResult<()> {
        let missing: Vec<&str> = Domain::ALL
            .iter()
            .filter(|d| !self.bindings.contains_key(d))
            .map(|d| d.label())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "No retriever bound for: {}",
                missing.join(", ")
            )))
        }
    }

    /// Bound domains in label order.
    pub fn domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.bindings.keys().copied()
    }
}

impl std::fmt::Debug for RetrieverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverTable")
            .field("domains", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}
