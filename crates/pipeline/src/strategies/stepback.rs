//! Step-back: retrieve for the question and a generalized form of it.

use super::{Strategy, StrategyDeps, StrategyKind};
use crate::context::format_documents;
use crate::router::Routed;
use lexrag_core::AppResult;
use lexrag_prompt::ids;
use serde_json::json;
use tracing::debug;

pub struct StepBackStrategy {
    deps: StrategyDeps,
}

impl StepBackStrategy {
    pub fn new(deps: StrategyDeps) -> Self {
        Self { deps }
    }

    /// Generalized form of `question`, trimmed.
    pub async fn step_back(&self, question: &str) -> AppResult<String> {
        let prompt = self
            .deps
            .prompts
            .render(ids::STEPBACK, &json!({ "question": question }))?;
        let reply = self.deps.generator.complete(&prompt).await?;
        Ok(reply.trim().to_string())
    }

    async fn retrieve_step_back(&self, query: &str) -> AppResult<Option<Routed>> {
        if query.is_empty() {
            debug!("Empty step-back query, skipping its retrieval");
            return Ok(None);
        }
        self.deps.router.retrieve(query).await.map(Some)
    }
}

#[async_trait::async_trait]
impl Strategy for StepBackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StepBack
    }

    async fn run(&self, question: &str) -> AppResult<String> {
        let step_back_query = self.step_back(question).await?;
        debug!(step_back = %step_back_query, "Generated step-back query");

        let (normal, step_back) = tokio::try_join!(
            self.deps.router.retrieve(question),
            self.retrieve_step_back(&step_back_query),
        )?;

        let step_back_documents = step_back.map(|r| r.documents).unwrap_or_default();

        let prompt = self.deps.prompts.render(
            ids::STEPBACK_ANSWER,
            &json!({
                "normal_context": format_documents(&normal.documents),
                "step_back_context": format_documents(&step_back_documents),
                "question": question,
            }),
        )?;
        self.deps.generator.complete(&prompt).await
    }
}
