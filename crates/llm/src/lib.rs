//! LLM integration crate for lexrag.
//!
//! This crate provides a provider-agnostic abstraction for talking to Large
//! Language Models, plus the `TextGenerator` seam the retrieval strategies
//! are written against.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//!
//! # Example
//! ```no_run
//! use lexrag_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is forced heirship?", "gemma3:27b");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod generator;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use generator::{strip_reasoning, LlmGenerator, TextGenerator};
pub use providers::OllamaClient;
pub use types::ProviderType;
