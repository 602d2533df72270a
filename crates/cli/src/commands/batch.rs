//! Batch command handler.

use crate::components;
use clap::Args;
use lexrag_core::{config::AppConfig, AppResult};
use lexrag_pipeline::run_batch;
use std::path::PathBuf;

/// Answer every question in a JSON Lines file
#[derive(Args, Debug)]
pub struct BatchCommand {
    /// Input file, one `{"question": ...}` object per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file; rows are appended and already answered questions skipped
    #[arg(short, long)]
    pub output: PathBuf,

    /// Run the strategies concurrently for each question
    #[arg(long)]
    pub parallel: bool,

    /// Output summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl BatchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing batch command: {:?} -> {:?}", self.input, self.output);

        let mut config = config.clone();
        config.pipeline.parallel_strategies |= self.parallel;
        let orchestrator = components::orchestrator(&config)?;

        let summary = run_batch(&orchestrator, &self.input, &self.output).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!(
                "Answered {} of {} questions ({} already done, {} strategy failures)",
                summary.processed, summary.total, summary.skipped, summary.strategy_failures
            );
        }

        Ok(())
    }
}
