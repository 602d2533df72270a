//! Configuration management for lexrag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.lexrag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: indexes, prompt overrides and the
//! config file all live under `.lexrag/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::Domain;
use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 1] = ["ollama"];

/// Main application configuration.
///
/// Constructed once at startup and passed explicitly to every component that
/// talks to a model or an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .lexrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Text generation settings
    pub llm: LlmSettings,

    /// Embedding settings used by the per-domain indexes
    pub embeddings: EmbeddingSettings,

    /// Retrieval and routing settings
    pub retrieval: RetrievalSettings,

    /// Strategy orchestration settings
    pub pipeline: PipelineSettings,
}

/// Text generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider identifier (e.g., "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Provider endpoint
    pub endpoint: String,

    /// Sampling temperature; kept low so answers are close to reproducible
    pub temperature: f32,

    /// Per-attempt timeout for one completion
    pub timeout_secs: u64,

    /// Attempts per completion before the failure is surfaced
    pub max_retries: u32,

    /// Remove `<think>...</think>` blocks emitted by reasoning models
    pub strip_reasoning: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "gemma3:27b".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 3,
            strip_reasoning: false,
        }
    }
}

impl LlmSettings {
    /// Per-attempt timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider identifier ("ollama" or "hashing")
    pub provider: String,

    /// Embedding model identifier
    pub model: String,

    /// Embedding endpoint; falls back to the LLM endpoint when unset
    pub endpoint: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

/// Retrieval and routing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Documents returned per retrieval
    pub top_k: usize,

    /// Domain used when classification output cannot be mapped to a label
    pub default_domain: Domain,

    /// Index directory, relative to the workspace unless absolute
    pub index_dir: PathBuf,

    /// Attempts per retrieval before a transient failure is surfaced
    pub max_retries: u32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            default_domain: Domain::Inheritance,
            index_dir: PathBuf::from(".lexrag/index"),
            max_retries: 3,
        }
    }
}

/// Strategy orchestration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Run the three strategies for one question concurrently
    pub parallel_strategies: bool,
}

/// Full configuration file structure. Every field is optional so a file only
/// needs to mention what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmFileConfig>,
    embeddings: Option<EmbeddingFileConfig>,
    retrieval: Option<RetrievalFileConfig>,
    pipeline: Option<PipelineFileConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmFileConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    strip_reasoning: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingFileConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalFileConfig {
    top_k: Option<usize>,
    default_domain: Option<Domain>,
    index_dir: Option<PathBuf>,
    max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineFileConfig {
    parallel_strategies: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embeddings: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `LEXRAG_WORKSPACE`: Override workspace path
    /// - `LEXRAG_CONFIG`: Path to config file
    /// - `LEXRAG_PROVIDER`: LLM provider
    /// - `LEXRAG_MODEL`: Model identifier
    /// - `OLLAMA_URL`: Provider endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use lexrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with the workspace and config file chosen
    /// up front so the right YAML file is merged.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("LEXRAG_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        if let Some(config_file) =
            config_file.or_else(|| std::env::var("LEXRAG_CONFIG").ok().map(PathBuf::from))
        {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.lexrag_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("LEXRAG_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("LEXRAG_MODEL") {
            config.llm.model = model;
        }

        if let Ok(endpoint) = std::env::var("OLLAMA_URL") {
            config.llm.endpoint = endpoint;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(llm) = file.llm {
            let target = &mut result.llm;
            if let Some(provider) = llm.provider {
                target.provider = provider;
            }
            if let Some(model) = llm.model {
                target.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                target.endpoint = endpoint;
            }
            if let Some(temperature) = llm.temperature {
                target.temperature = temperature;
            }
            if let Some(timeout) = llm.timeout_secs {
                target.timeout_secs = timeout;
            }
            if let Some(retries) = llm.max_retries {
                target.max_retries = retries;
            }
            if let Some(strip) = llm.strip_reasoning {
                target.strip_reasoning = strip;
            }
        }

        if let Some(embeddings) = file.embeddings {
            let target = &mut result.embeddings;
            if let Some(provider) = embeddings.provider {
                target.provider = provider;
            }
            if let Some(model) = embeddings.model {
                target.model = model;
            }
            if embeddings.endpoint.is_some() {
                target.endpoint = embeddings.endpoint;
            }
            if let Some(timeout) = embeddings.timeout_secs {
                target.timeout_secs = timeout;
            }
        }

        if let Some(retrieval) = file.retrieval {
            let target = &mut result.retrieval;
            if let Some(top_k) = retrieval.top_k {
                target.top_k = top_k;
            }
            if let Some(domain) = retrieval.default_domain {
                target.default_domain = domain;
            }
            if let Some(dir) = retrieval.index_dir {
                target.index_dir = dir;
            }
            if let Some(retries) = retrieval.max_retries {
                target.max_retries = retries;
            }
        }

        if let Some(pipeline) = file.pipeline {
            if let Some(parallel) = pipeline.parallel_strategies {
                result.pipeline.parallel_strategies = parallel;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        default_domain: Option<Domain>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(domain) = default_domain {
            self.retrieval.default_domain = domain;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .lexrag directory.
    pub fn lexrag_dir(&self) -> PathBuf {
        self.workspace.join(".lexrag")
    }

    /// Ensure the .lexrag directory exists.
    pub fn ensure_lexrag_dir(&self) -> AppResult<()> {
        let dir = self.lexrag_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .lexrag directory: {}", e))
            })?;
            tracing::debug!("Created {:?}", dir);
        }
        Ok(())
    }

    /// Directory holding the per-domain indexes.
    pub fn index_dir(&self) -> PathBuf {
        if self.retrieval.index_dir.is_absolute() {
            self.retrieval.index_dir.clone()
        } else {
            self.workspace.join(&self.retrieval.index_dir)
        }
    }

    /// Path of one domain's SQLite index.
    pub fn index_path(&self, domain: Domain) -> PathBuf {
        self.index_dir().join(format!("{}.sqlite", domain.slug()))
    }

    /// Endpoint used for embeddings.
    pub fn embedding_endpoint(&self) -> &str {
        self.embeddings
            .endpoint
            .as_deref()
            .unwrap_or(&self.llm.endpoint)
    }

    /// Validate the configuration before any component is built.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !self.llm.temperature.is_finite() || !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be within 0.0-2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.max_retries == 0 || self.retrieval.max_retries == 0 {
            return Err(AppError::Config(
                "maxRetries must be at least 1".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        Ok(())
    }
}
