//! Ask command handler.
//!
//! Answers one question with one or all strategies.

use crate::components;
use clap::Args;
use lexrag_core::{config::AppConfig, AppError, AppResult};
use lexrag_pipeline::StrategyKind;

/// Answer one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Strategy to run (repeatable; default: all)
    #[arg(short, long = "strategy")]
    pub strategies: Vec<StrategyKind>,

    /// Only show which domain the question is routed to
    #[arg(long)]
    pub route: bool,

    /// Run the strategies concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        if self.route {
            let router = components::router(config, components::prompts(config)?)?;
            let domain = router.classify(question).await?;

            if self.json {
                let output = serde_json::json!({
                    "question": question,
                    "domain": domain,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", domain);
            }
            return Ok(());
        }

        let mut config = config.clone();
        config.pipeline.parallel_strategies |= self.parallel;
        let orchestrator = components::orchestrator(&config)?;

        let kinds = if self.strategies.is_empty() {
            StrategyKind::ALL.to_vec()
        } else {
            self.strategies.clone()
        };
        let results = orchestrator.run_selected(question, &kinds).await;

        if self.json {
            let strategies: Vec<_> = results
                .results
                .values()
                .map(|r| {
                    serde_json::json!({
                        "strategy": r.strategy,
                        "answer": r.answer,
                        "latencySecs": r.latency.as_secs_f64(),
                        "error": r.error,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "question": results.question,
                "results": strategies,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for result in results.results.values() {
                println!(
                    "== {} ({:.2}s) ==",
                    result.strategy,
                    result.latency.as_secs_f64()
                );
                match &result.error {
                    Some(error) => println!("error: {}\n", error),
                    None => println!("{}\n", result.answer.trim()),
                }
            }
        }

        if results.failures() == results.results.len() {
            return Err(AppError::Pipeline(format!(
                "All {} strategies failed",
                results.results.len()
            )));
        }

        Ok(())
    }
}
