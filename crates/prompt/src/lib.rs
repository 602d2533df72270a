//! Prompt system for lexrag.
//!
//! This crate provides structured prompt management with:
//! - Built-in templates for routing, the three retrieval strategies and judging
//! - YAML-based overrides under `.lexrag/prompts/`
//! - Handlebars template rendering in strict mode

pub mod builtin;
pub mod library;
pub mod loader;
pub mod types;

// Re-export main types
pub use builtin::ids;
pub use library::PromptLibrary;
pub use loader::{list_prompts, load_prompt};
pub use types::PromptDefinition;
