//! lexrag CLI
//!
//! Answers legal questions with routed retrieval-augmented generation and
//! manages the per-domain document indexes.

mod commands;
mod components;

use clap::{Parser, Subcommand};
use commands::{AskCommand, BatchCommand, EvalCommand, IndexCommand};
use lexrag_core::{config::AppConfig, logging, AppResult, Domain};
use std::path::PathBuf;

/// lexrag - routed multi-strategy RAG over legal corpora
#[derive(Parser, Debug)]
#[command(name = "lexrag")]
#[command(about = "Routed multi-strategy RAG over legal corpora", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LEXRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LEXRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider
    #[arg(short, long, global = true, env = "LEXRAG_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "LEXRAG_MODEL")]
    model: Option<String>,

    /// Domain used when a question cannot be classified
    #[arg(long, global = true)]
    default_domain: Option<Domain>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer one question
    Ask(AskCommand),

    /// Answer every question in a JSON Lines file
    Batch(BatchCommand),

    /// Manage the per-domain document indexes
    Index(IndexCommand),

    /// Score batch answers against reference answers
    Eval(EvalCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.default_domain,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("lexrag starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Model: {} ({})", config.llm.model, config.llm.provider);

    config.ensure_lexrag_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Batch(_) => "batch",
        Commands::Index(_) => "index",
        Commands::Eval(_) => "eval",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Batch(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
