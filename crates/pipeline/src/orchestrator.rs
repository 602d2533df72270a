//! Runs every strategy on a question, timing each and isolating failures.

use crate::router::Router;
use crate::strategies::{all_strategies, Strategy, StrategyDeps, StrategyKind};
use futures::future::join_all;
use lexrag_core::config::PipelineSettings;
use lexrag_llm::TextGenerator;
use lexrag_prompt::PromptLibrary;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

/// Outcome of one strategy on one question.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub strategy: StrategyKind,

    /// Final answer; empty when the strategy failed
    pub answer: String,

    /// Wall time of the strategy's own run
    pub latency: Duration,

    /// Failure message, if the strategy failed
    pub error: Option<String>,
}

impl StrategyResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Every strategy's result for one question.
#[derive(Debug, Clone)]
pub struct QuestionResults {
    pub question: String,
    pub results: BTreeMap<StrategyKind, StrategyResult>,
}

impl QuestionResults {
    pub fn get(&self, kind: StrategyKind) -> Option<&StrategyResult> {
        self.results.get(&kind)
    }

    /// Number of strategies that failed.
    pub fn failures(&self) -> usize {
        self.results.values().filter(|r| !r.is_success()).count()
    }
}

/// Runs strategies independently against a question.
pub struct Orchestrator {
    strategies: Vec<Arc<dyn Strategy>>,
    parallel: bool,
}

impl Orchestrator {
    /// Orchestrate the given strategies.
    pub fn new(strategies: Vec<Arc<dyn Strategy>>, parallel: bool) -> Self {
        Self {
            strategies,
            parallel,
        }
    }

    /// Orchestrator over all three strategies built from shared collaborators.
    pub fn from_parts(
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptLibrary>,
        router: Arc<Router>,
        settings: &PipelineSettings,
    ) -> Self {
        let deps = StrategyDeps {
            generator,
            prompts,
            router,
        };
        Self::new(all_strategies(&deps), settings.parallel_strategies)
    }

    /// Strategies this orchestrator runs.
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Run every strategy on `question`.
    pub async fn run_all(&self, question: &str) -> QuestionResults {
        self.run_selected(question, &StrategyKind::ALL).await
    }

    /// Run the strategies in `kinds` on `question`.
    ///
    /// A failing strategy is recorded in its result and never stops the others.
    pub async fn run_selected(&self, question: &str, kinds: &[StrategyKind]) -> QuestionResults {
        let selected: Vec<&Arc<dyn Strategy>> = self
            .strategies
            .iter()
            .filter(|s| kinds.contains(&s.kind()))
            .collect();

        let outcomes = if self.parallel {
            join_all(selected.iter().map(|s| run_timed(Arc::as_ref(s), question))).await
        } else {
            let mut outcomes = Vec::with_capacity(selected.len());
            for strategy in selected {
                outcomes.push(run_timed(Arc::as_ref(strategy), question).await);
            }
            outcomes
        };

        QuestionResults {
            question: question.to_string(),
            results: outcomes.into_iter().map(|r| (r.strategy, r)).collect(),
        }
    }
}

/// Run one strategy under its own span and clock.
async fn run_timed(strategy: &dyn Strategy, question: &str) -> StrategyResult {
    let kind = strategy.kind();
    let span = info_span!("strategy", name = kind.as_str());

    async move {
        let start = Instant::now();
        let outcome = strategy.run(question).await;
        let latency = start.elapsed();

        match outcome {
            Ok(answer) => {
                info!(latency_ms = latency.as_millis() as u64, "Strategy finished");
                StrategyResult {
                    strategy: kind,
                    answer,
                    latency,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    latency_ms = latency.as_millis() as u64,
                    error = %e,
                    "Strategy failed"
                );
                StrategyResult {
                    strategy: kind,
                    answer: String::new(),
                    latency,
                    error: Some(e.to_string()),
                }
            }
        }
    }
    .instrument(span)
    .await
}
