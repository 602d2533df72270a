//! Multi-query: paraphrase, retrieve per paraphrase, merge, answer.

use super::{Strategy, StrategyDeps, StrategyKind};
use crate::context::{format_documents, unique_union};
use crate::parse::split_lines;
use futures::future::try_join_all;
use lexrag_core::AppResult;
use lexrag_prompt::ids;
use serde_json::json;
use tracing::debug;

/// Paraphrases requested per question.
pub const DEFAULT_PERSPECTIVES: usize = 5;

pub struct MultiQueryStrategy {
    deps: StrategyDeps,
    perspectives: usize,
}

impl MultiQueryStrategy {
    pub fn new(deps: StrategyDeps) -> Self {
        Self {
            deps,
            perspectives: DEFAULT_PERSPECTIVES,
        }
    }

    /// Override the number of paraphrases asked for.
    pub fn with_perspectives(mut self, perspectives: usize) -> Self {
        self.perspectives = perspectives;
        self
    }

    async fn expand(&self, question: &str) -> AppResult<Vec<String>> {
        let prompt = self.deps.prompts.render(
            ids::MULTIQUERY,
            &json!({ "question": question, "count": self.perspectives }),
        )?;
        let reply = self.deps.generator.complete(&prompt).await?;
        Ok(split_lines(&reply))
    }
}

#[async_trait::async_trait]
impl Strategy for MultiQueryStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MultiQuery
    }

    async fn run(&self, question: &str) -> AppResult<String> {
        let queries = self.expand(question).await?;
        debug!(count = queries.len(), ?queries, "Generated alternative queries");

        let routed = try_join_all(queries.iter().map(|q| self.deps.router.retrieve(q))).await?;

        let retrieved: usize = routed.iter().map(|r| r.documents.len()).sum();
        let documents = unique_union(routed.into_iter().flat_map(|r| r.documents));
        debug!(
            retrieved,
            unique = documents.len(),
            "Merged retrieved documents"
        );

        let prompt = self.deps.prompts.render(
            ids::RAG_ANSWER,
            &json!({ "context": format_documents(&documents), "question": question }),
        )?;
        self.deps.generator.complete(&prompt).await
    }
}
