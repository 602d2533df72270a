//! Decomposition: answer sub-questions in order, then synthesize.

use super::{Strategy, StrategyDeps, StrategyKind};
use crate::context::format_documents;
use crate::history::QaHistory;
use crate::parse::split_lines;
use lexrag_core::AppResult;
use lexrag_prompt::ids;
use serde_json::json;
use tracing::debug;

/// Sub-questions requested per question.
pub const DEFAULT_SUB_QUESTIONS: usize = 3;

pub struct DecompositionStrategy {
    deps: StrategyDeps,
    sub_questions: usize,
}

impl DecompositionStrategy {
    pub fn new(deps: StrategyDeps) -> Self {
        Self {
            deps,
            sub_questions: DEFAULT_SUB_QUESTIONS,
        }
    }

    /// Override the number of sub-questions asked for.
    pub fn with_sub_questions(mut self, sub_questions: usize) -> Self {
        self.sub_questions = sub_questions;
        self
    }

    async fn decompose(&self, question: &str) -> AppResult<Vec<String>> {
        let prompt = self.deps.prompts.render(
            ids::DECOMPOSITION,
            &json!({ "question": question, "count": self.sub_questions }),
        )?;
        let reply = self.deps.generator.complete(&prompt).await?;
        Ok(split_lines(&reply))
    }

    /// Answer each sub-question in order, each seeing the pairs before it.
    pub async fn answer_sub_questions(&self, sub_questions: &[String]) -> AppResult<QaHistory> {
        let mut history = QaHistory::new();

        for sub_question in sub_questions {
            let routed = self.deps.router.retrieve(sub_question).await?;
            debug!(
                domain = %routed.domain,
                documents = routed.documents.len(),
                "Answering sub-question"
            );

            let prompt = self.deps.prompts.render(
                ids::DECOMPOSITION_ANSWER,
                &json!({
                    "context": format_documents(&routed.documents),
                    "question": sub_question,
                    "history": history.render(),
                }),
            )?;
            let answer = self.deps.generator.complete(&prompt).await?;
            history.push(sub_question.as_str(), answer);
        }

        Ok(history)
    }
}

#[async_trait::async_trait]
impl Strategy for DecompositionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Decomposition
    }

    async fn run(&self, question: &str) -> AppResult<String> {
        let sub_questions = self.decompose(question).await?;
        debug!(count = sub_questions.len(), ?sub_questions, "Generated sub-questions");

        let history = self.answer_sub_questions(&sub_questions).await?;

        let prompt = self.deps.prompts.render(
            ids::DECOMPOSITION_SYNTHESIS,
            &json!({ "history": history.render(), "question": question }),
        )?;
        self.deps.generator.complete(&prompt).await
    }
}
