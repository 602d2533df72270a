//! Prompt types for lexrag.

use lexrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Variables the template expects; rendering fails if one is missing
    #[serde(default)]
    pub variables: Vec<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    /// Create a definition with API version 1.0.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        variables: &[&str],
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            api_version: "1.0".to_string(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            template: template.into(),
        }
    }

    /// Validate required fields.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.is_empty() {
            return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
        }

        if self.title.is_empty() {
            return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
        }

        if self.template.trim().is_empty() {
            return Err(AppError::Prompt(format!(
                "Prompt template cannot be empty: {}",
                self.id
            )));
        }

        if !self.api_version.contains('.') {
            return Err(AppError::Prompt(format!(
                "Invalid apiVersion format: {}. Expected format: 'x.y'",
                self.api_version
            )));
        }

        Ok(())
    }
}
