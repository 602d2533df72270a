//! Query routing and multi-strategy retrieval-augmented answering.
//!
//! A question is answered by three independent strategies:
//! - **MultiQuery**: paraphrase, retrieve per paraphrase, merge, answer
//! - **Decomposition**: answer sub-questions in order, then synthesize
//! - **StepBack**: retrieve for the question and a generalized form of it
//!
//! Every retrieval goes through the [`Router`], which classifies the query
//! into a [`Domain`](lexrag_core::Domain) and picks that domain's retriever.
//! The [`Orchestrator`] runs the strategies and times each one; the batch and
//! evaluation modules drive it over question files.

pub mod batch;
pub mod context;
pub mod evaluation;
pub mod history;
pub mod orchestrator;
pub mod parse;
pub mod router;
pub mod strategies;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use batch::{run_batch, BatchRecord, BatchSummary};
pub use evaluation::{evaluate, AnswerJudge, EvaluationRow, Reference};
pub use history::{QaHistory, QaPair};
pub use orchestrator::{Orchestrator, QuestionResults, StrategyResult};
pub use router::{Routed, Router};
pub use strategies::{
    DecompositionStrategy, MultiQueryStrategy, StepBackStrategy, Strategy, StrategyKind,
};
