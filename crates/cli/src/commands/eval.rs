//! Eval command handler.
//!
//! Scores batch answers against reference answers with an LLM judge.

use crate::components;
use clap::Args;
use lexrag_core::{config::AppConfig, AppResult};
use lexrag_pipeline::batch::{read_jsonl, BatchRecord, BatchWriter};
use lexrag_pipeline::evaluation::mean_accuracy;
use lexrag_pipeline::{evaluate, AnswerJudge, Reference};
use std::path::PathBuf;

/// Score batch answers against reference answers
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// Batch output file
    #[arg(short, long)]
    pub answers: PathBuf,

    /// Reference file, one `{"question", "answer"}` object per line
    #[arg(short, long)]
    pub references: PathBuf,

    /// Scores file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Judge model
    #[arg(long, default_value = "llama3.3")]
    pub judge_model: String,

    /// Output summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Evaluating {:?} against {:?}", self.answers, self.references);

        let records: Vec<BatchRecord> = read_jsonl(&self.answers)?;
        let references: Vec<Reference> = read_jsonl(&self.references)?;

        let mut judge_settings = config.llm.clone();
        judge_settings.model = self.judge_model.clone();
        let judge = AnswerJudge::new(
            components::generator(&judge_settings)?,
            components::prompts(config)?,
        );

        let rows = evaluate(&judge, &references, &records).await;

        if self.output.exists() {
            std::fs::remove_file(&self.output)?;
        }
        let mut writer = BatchWriter::open(&self.output)?;
        for row in &rows {
            writer.append(row)?;
        }

        let means = mean_accuracy(&rows);
        if self.json {
            let output = serde_json::json!({
                "rows": rows.len(),
                "meanAccuracy": means,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Scored {} questions", rows.len());
            for (kind, mean) in &means {
                match mean {
                    Some(mean) => println!("  {}: {:.3}", kind, mean),
                    None => println!("  {}: n/a", kind),
                }
            }
        }

        Ok(())
    }
}
