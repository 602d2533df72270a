//! The three answering strategies.

pub mod decomposition;
pub mod multiquery;
pub mod stepback;

pub use decomposition::DecompositionStrategy;
pub use multiquery::MultiQueryStrategy;
pub use stepback::StepBackStrategy;

use crate::router::Router;
use lexrag_core::{AppError, AppResult};
use lexrag_llm::TextGenerator;
use lexrag_prompt::PromptLibrary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Strategy identifiers, also used as column prefixes in batch output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    MultiQuery,
    Decomposition,
    StepBack,
}

impl StrategyKind {
    /// All strategies in run order.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::MultiQuery,
        StrategyKind::Decomposition,
        StrategyKind::StepBack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::MultiQuery => "multiquery",
            StrategyKind::Decomposition => "decomposition",
            StrategyKind::StepBack => "stepback",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "multiquery" => Ok(StrategyKind::MultiQuery),
            "decomposition" => Ok(StrategyKind::Decomposition),
            "stepback" => Ok(StrategyKind::StepBack),
            _ => Err(AppError::Config(format!(
                "Unknown strategy: {}. Supported: multiquery, decomposition, stepback",
                s
            ))),
        }
    }
}

/// A way of answering one question.
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Answer `question`. Generation and retrieval failures propagate.
    async fn run(&self, question: &str) -> AppResult<String>;
}

/// Collaborators shared by every strategy.
#[derive(Clone)]
pub struct StrategyDeps {
    pub generator: Arc<dyn TextGenerator>,
    pub prompts: Arc<PromptLibrary>,
    pub router: Arc<Router>,
}

/// One instance of each strategy, in run order.
pub fn all_strategies(deps: &StrategyDeps) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(MultiQueryStrategy::new(deps.clone())),
        Arc::new(DecompositionStrategy::new(deps.clone())),
        Arc::new(StepBackStrategy::new(deps.clone())),
    ]
}
