//! Text generation seam used by the retrieval strategies.
//!
//! `TextGenerator` is the narrow prompt-in, text-out interface the pipeline is
//! written against. `LlmGenerator` adapts any `LlmClient` to it, pinning the
//! model and temperature from configuration and bounding every call with a
//! timeout and a retry budget.

use crate::client::{LlmClient, LlmRequest};
use lexrag_core::config::LlmSettings;
use lexrag_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Initial backoff between retries; doubled after every failed attempt.
const INITIAL_BACKOFF_MS: u64 = 250;

/// Prompt-in, completion-out text generation.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` and return the raw text. Parsing is the caller's job.
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

/// `TextGenerator` backed by an `LlmClient`.
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    timeout: Duration,
    max_retries: u32,
    strip_reasoning: bool,
    initial_backoff: Duration,
}

impl LlmGenerator {
    /// Build a generator from the configured LLM settings.
    pub fn new(client: Arc<dyn LlmClient>, settings: &LlmSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.timeout(),
            max_retries: settings.max_retries.max(1),
            strip_reasoning: settings.strip_reasoning,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    /// Override the initial retry backoff.
    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Model this generator sends requests to.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn attempt(&self, request: &LlmRequest) -> AppResult<String> {
        let response = tokio::time::timeout(self.timeout, self.client.complete(request))
            .await
            .map_err(|_| AppError::Timeout {
                operation: format!("completion with {}", self.model),
                elapsed: self.timeout,
            })??;

        Ok(response.content)
    }
}

#[async_trait::async_trait]
impl TextGenerator for LlmGenerator {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model).with_temperature(self.temperature);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(&request).await {
                Ok(content) => {
                    debug!(attempt, chars = content.len(), "Completion succeeded");
                    return Ok(if self.strip_reasoning {
                        strip_reasoning(&content)
                    } else {
                        content
                    });
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                    warn!(
                        "Completion failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_retries,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Remove `<think>...</think>` blocks emitted by reasoning models.
///
/// An unterminated block is left untouched so no answer text is lost.
pub fn strip_reasoning(text: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        let Some(len) = rest[start..].find(CLOSE) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + len + CLOSE.len()..];
    }
    out.push_str(rest);

    out.trim().to_string()
}
