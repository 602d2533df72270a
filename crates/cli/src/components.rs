//! Builds the pipeline's collaborators from configuration.

use lexrag_core::config::{AppConfig, LlmSettings};
use lexrag_core::AppResult;
use lexrag_llm::{create_client, LlmGenerator, TextGenerator};
use lexrag_pipeline::{Orchestrator, Router};
use lexrag_prompt::PromptLibrary;
use lexrag_retrieval::{create_provider, open_table, EmbeddingProvider};
use std::sync::Arc;

/// Text generator for the given LLM settings.
pub fn generator(settings: &LlmSettings) -> AppResult<Arc<dyn TextGenerator>> {
    let client = create_client(settings)?;
    let generator = LlmGenerator::new(client, settings);
    tracing::debug!("Using model {} via {}", generator.model(), settings.provider);
    Ok(Arc::new(generator))
}

/// Built-in prompts plus workspace overrides.
pub fn prompts(config: &AppConfig) -> AppResult<Arc<PromptLibrary>> {
    Ok(Arc::new(PromptLibrary::load(&config.workspace)?))
}

/// Embedding provider for indexing and queries.
pub fn embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(&config.embeddings, config.embedding_endpoint())
}

/// Router over every domain index.
pub fn router(config: &AppConfig, prompts: Arc<PromptLibrary>) -> AppResult<Arc<Router>> {
    let table = open_table(config, embedder(config)?)?;
    let router = Router::new(
        generator(&config.llm)?,
        prompts,
        table,
        config.retrieval.default_domain,
    )?;
    Ok(Arc::new(router))
}

/// Orchestrator over all strategies.
pub fn orchestrator(config: &AppConfig) -> AppResult<Orchestrator> {
    let prompts = prompts(config)?;
    let router = router(config, prompts.clone())?;

    Ok(Orchestrator::from_parts(
        generator(&config.llm)?,
        prompts,
        router,
        &config.pipeline,
    ))
}
