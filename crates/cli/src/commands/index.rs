//! Index command handler.
//!
//! Manages the per-domain SQLite indexes.

use crate::components;
use clap::{Args, Subcommand};
use lexrag_core::{config::AppConfig, AppResult, Domain};
use lexrag_retrieval::{index, ingest_folder, IndexRetriever};
use std::path::PathBuf;
use std::time::Duration;

/// Manage the per-domain document indexes
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Ingest a folder of `*.json` law documents into a domain
    Add(IndexAddCommand),
    /// Show index statistics
    Stats(IndexStatsCommand),
    /// Delete every document of a domain
    Reset(IndexResetCommand),
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Add(cmd) => cmd.execute(config).await,
            IndexAction::Stats(cmd) => cmd.execute(config),
            IndexAction::Reset(cmd) => cmd.execute(config),
        }
    }
}

/// Ingest law documents
#[derive(Args, Debug)]
pub struct IndexAddCommand {
    /// Domain the documents belong to
    #[arg(short, long)]
    pub domain: Domain,

    /// Folder holding `{content, metadata}` JSON files
    pub path: PathBuf,

    /// Reset the domain before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexAddCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Ingesting {:?} into {}", self.path, self.domain);

        let db_path = config.index_path(self.domain);
        if self.reset {
            index::reset_index(&index::init_index(&db_path)?)?;
        }

        let embedder = components::embedder(config)?;
        let stats = ingest_folder(&db_path, embedder.as_ref(), &self.path).await?;

        if self.json {
            let output = serde_json::json!({
                "domain": self.domain,
                "filesSeen": stats.files_seen,
                "documentsIndexed": stats.documents_indexed,
                "skipped": stats.skipped,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents into {} ({} files, {} skipped) in {:.2}s",
                stats.documents_indexed,
                self.domain,
                stats.files_seen,
                stats.skipped,
                stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Show index statistics
#[derive(Args, Debug)]
pub struct IndexStatsCommand {
    /// Only this domain (default: all)
    #[arg(short, long)]
    pub domain: Option<Domain>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let domains: Vec<Domain> = match self.domain {
            Some(domain) => vec![domain],
            None => Domain::ALL.to_vec(),
        };

        let embedder = components::embedder(config)?;
        let mut all_stats = Vec::with_capacity(domains.len());
        for domain in domains {
            let retriever = IndexRetriever::open(
                &config.index_path(domain),
                domain,
                embedder.clone(),
                config.retrieval.top_k,
                Duration::from_secs(config.embeddings.timeout_secs),
            )?;
            all_stats.push(retriever.stats()?);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&all_stats)?);
        } else {
            for stats in &all_stats {
                let last = stats
                    .last_indexed_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}: {} documents, {} bytes, last indexed {}",
                    stats.domain, stats.documents_count, stats.db_size_bytes, last
                );
            }
        }

        Ok(())
    }
}

/// Delete every document of a domain
#[derive(Args, Debug)]
pub struct IndexResetCommand {
    /// Domain to reset
    #[arg(short, long)]
    pub domain: Domain,
}

impl IndexResetCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let conn = index::init_index(&config.index_path(self.domain))?;
        index::reset_index(&conn)?;
        println!("Reset {} index", self.domain);
        Ok(())
    }
}
