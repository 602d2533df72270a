//! Prompt library: compiled templates addressed by id.

use crate::builtin;
use crate::loader;
use crate::types::PromptDefinition;
use handlebars::Handlebars;
use lexrag_core::{AppError, AppResult};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Compiled prompt templates.
///
/// Built once at startup and shared read-only by every strategy.
pub struct PromptLibrary {
    registry: Handlebars<'static>,
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library with only the built-in templates.
    pub fn builtin() -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Prompts are plain text, never HTML
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        let mut library = Self {
            registry,
            definitions: HashMap::new(),
        };

        for definition in builtin::definitions() {
            library.register(definition)?;
        }

        Ok(library)
    }

    /// Built-in templates, replaced by any overrides found in the workspace.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let mut library = Self::builtin()?;

        for id in loader::list_prompts(workspace)? {
            let definition = loader::load_prompt(workspace, &id)?;
            if !library.definitions.contains_key(&definition.id) {
                tracing::warn!("Prompt override '{}' does not replace a known prompt", id);
            }
            library.register(definition)?;
        }

        Ok(library)
    }

    /// Register (or replace) a template.
    pub fn register(&mut self, definition: PromptDefinition) -> AppResult<()> {
        definition.validate()?;

        self.registry
            .register_template_string(&definition.id, &definition.template)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to register template '{}': {}",
                    definition.id, e
                ))
            })?;

        tracing::debug!("Registered prompt: {}", definition.id);
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Look up a definition.
    pub fn definition(&self, id: &str) -> Option<&PromptDefinition> {
        self.definitions.get(id)
    }

    /// Render template `id` with `variables`.
    ///
    /// Fails if the template is unknown or a declared variable is missing.
    pub fn render<T: Serialize>(&self, id: &str, variables: &T) -> AppResult<String> {
        let definition = self
            .definitions
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", id)))?;

        let data = serde_json::to_value(variables)
            .map_err(|e| AppError::Prompt(format!("Invalid variables for '{}': {}", id, e)))?;

        if let Some(missing) = definition
            .variables
            .iter()
            .find(|v| data.get(v.as_str()).is_none())
        {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' requires variable '{}'",
                id, missing
            )));
        }

        self.registry
            .render(id, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", id, e)))
    }
}
