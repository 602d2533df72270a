//! Retrieval type definitions.

use chrono::{DateTime, Utc};
use lexrag_core::Domain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A retrieved law document.
///
/// Two documents are the same document iff both content and metadata match;
/// `Eq` and `Hash` are derived on exactly those fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    /// Text content
    pub content: String,

    /// Metadata (e.g., article number, source code, title)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// On-disk law document as found in the corpus folders.
///
/// Metadata values may be any JSON scalar; they are flattened to strings.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        let metadata = raw
            .metadata
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect();

        Self {
            content: raw.content,
            metadata,
        }
    }
}

/// Statistics for one domain index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Domain the index belongs to
    pub domain: Domain,

    /// Number of documents
    pub documents_count: u32,

    /// Database size in bytes
    pub db_size_bytes: u64,

    /// Most recent ingestion time
    pub last_indexed_at: Option<DateTime<Utc>>,
}
