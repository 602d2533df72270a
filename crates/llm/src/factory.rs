//! LLM provider factory.
//!
//! Builds an `LlmClient` from the configured provider name and endpoint.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use crate::types::ProviderType;
use lexrag_core::config::LlmSettings;
use lexrag_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client from the LLM settings.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(&settings.provider) {
        Some(ProviderType::Ollama) => {
            let client = OllamaClient::with_timeout(&settings.endpoint, settings.timeout())?;
            Ok(Arc::new(client))
        }
        None => Err(AppError::Config(format!(
            "Unknown provider: {}",
            settings.provider
        ))),
    }
}
