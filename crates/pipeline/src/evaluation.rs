//! LLM-as-judge answer accuracy for batch output.

use crate::batch::BatchRecord;
use crate::parse::parse_rating;
use crate::strategies::StrategyKind;
use lexrag_core::AppResult;
use lexrag_llm::TextGenerator;
use lexrag_prompt::{ids, PromptLibrary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Highest judge rating.
const MAX_RATING: f64 = 4.0;

/// Reference answer for a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub question: String,
    pub answer: String,
}

/// A batch row joined with its reference answer, plus the accuracy of every
/// strategy (`None` when unscored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(flatten)]
    pub record: BatchRecord,
    /// Reference answer
    pub answer: String,
    pub multiquery_accuracy: Option<f64>,
    pub decomposition_accuracy: Option<f64>,
    pub stepback_accuracy: Option<f64>,
}

impl EvaluationRow {
    pub fn accuracy(&self, kind: StrategyKind) -> Option<f64> {
        match kind {
            StrategyKind::MultiQuery => self.multiquery_accuracy,
            StrategyKind::Decomposition => self.decomposition_accuracy,
            StrategyKind::StepBack => self.stepback_accuracy,
        }
    }

    fn set_accuracy(&mut self, kind: StrategyKind, score: Option<f64>) {
        match kind {
            StrategyKind::MultiQuery => self.multiquery_accuracy = score,
            StrategyKind::Decomposition => self.decomposition_accuracy = score,
            StrategyKind::StepBack => self.stepback_accuracy = score,
        }
    }
}

/// Scores a response against a reference with two judge passes.
pub struct AnswerJudge {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl AnswerJudge {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }

    /// Accuracy in [0, 1].
    ///
    /// The forward pass rates the response against the reference and the
    /// reverse pass swaps their roles. Valid ratings are averaged; `None`
    /// if neither pass produced one. A blank response scores 0 without a call.
    pub async fn score(
        &self,
        question: &str,
        response: &str,
        reference: &str,
    ) -> AppResult<Option<f64>> {
        if response.trim().is_empty() {
            return Ok(Some(0.0));
        }

        let variables = json!({
            "question": question,
            "response": response,
            "reference": reference,
        });

        let mut ratings = Vec::with_capacity(2);
        for id in [ids::JUDGE_FORWARD, ids::JUDGE_REVERSE] {
            let prompt = self.prompts.render(id, &variables)?;
            let reply = self.generator.complete(&prompt).await?;
            match parse_rating(&reply) {
                Some(rating) => ratings.push(f64::from(rating)),
                None => debug!(judge = id, reply = %reply.trim(), "Unparseable rating"),
            }
        }

        if ratings.is_empty() {
            return Ok(None);
        }

        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        Ok(Some(mean / MAX_RATING))
    }
}

/// Score every batch row that has a reference (inner join on question).
///
/// Judge failures leave that cell unscored and do not stop the run.
pub async fn evaluate(
    judge: &AnswerJudge,
    references: &[Reference],
    records: &[BatchRecord],
) -> Vec<EvaluationRow> {
    let by_question: HashMap<&str, &str> = references
        .iter()
        .map(|r| (r.question.as_str(), r.answer.as_str()))
        .collect();

    let mut rows = Vec::new();
    for record in records {
        let Some(reference) = by_question.get(record.question.as_str()) else {
            debug!(question = %record.question, "No reference, skipping");
            continue;
        };

        let mut row = EvaluationRow {
            record: record.clone(),
            answer: reference.to_string(),
            multiquery_accuracy: None,
            decomposition_accuracy: None,
            stepback_accuracy: None,
        };

        for kind in StrategyKind::ALL {
            let score = match judge
                .score(&record.question, record.answer(kind), reference)
                .await
            {
                Ok(score) => score,
                Err(e) => {
                    warn!(strategy = %kind, error = %e, "Judge failed");
                    None
                }
            };
            row.set_accuracy(kind, score);
        }

        rows.push(row);
    }

    info!(
        rows = rows.len(),
        records = records.len(),
        references = references.len(),
        "Evaluation finished"
    );

    rows
}

/// Mean accuracy per strategy over scored cells.
pub fn mean_accuracy(rows: &[EvaluationRow]) -> BTreeMap<StrategyKind, Option<f64>> {
    StrategyKind::ALL
        .iter()
        .map(|&kind| {
            let scores: Vec<f64> = rows.iter().filter_map(|r| r.accuracy(kind)).collect();
            let mean = if scores.is_empty() {
                None
            } else {
                Some(scores.iter().sum::<f64>() / scores.len() as f64)
            };
            (kind, mean)
        })
        .collect()
}
