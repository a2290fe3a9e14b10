//! Configuration for the assistant
//!
//! Sources are layered in this order, later ones winning:
//! built-in defaults, an optional TOML file, then environment variables
//! prefixed with `SCHOOL_ASSISTANT` using `__` between sections
//! (e.g. `SCHOOL_ASSISTANT__RETRIEVAL__TOP_K=3`). Provider credentials are
//! also picked up from `GEMINI_API_KEY` / `GEMINI_MODEL`,
//! `OPENAI_API_KEY` and `EMBEDDING_API_KEY` when not set explicitly.

use crate::error::{AssistantError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "SCHOOL_ASSISTANT";
const DEFAULT_FILE: &str = "school-assistant";

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which embedding backend builds the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local feature-hashing embedder
    Hashing,
    /// OpenAI-compatible embeddings endpoint
    Http,
}

/// Embedding configuration
#[derive(Debug, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProvider,

    /// Bucket count for the hashing embedder
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_embedding_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum cached query embeddings
    #[serde(default = "default_query_cache_size")]
    pub query_cache_size: u64,
}

fn default_embedding_provider() -> EmbeddingProvider { EmbeddingProvider::Hashing }
fn default_dimension() -> usize { 1024 }
fn default_embedding_url() -> String { "https://api.openai.com/v1/embeddings".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_embedding_timeout_ms() -> u64 { 10_000 }
fn default_query_cache_size() -> u64 { 256 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dimension: default_dimension(),
            api_url: default_embedding_url(),
            api_key: None,
            model: default_embedding_model(),
            timeout_ms: default_embedding_timeout_ms(),
            query_cache_size: default_query_cache_size(),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Facts forwarded to the model per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Drop facts whose normalized text repeats an earlier one
    #[serde(default)]
    pub collapse_duplicates: bool,
}

fn default_top_k() -> usize { 2 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            collapse_duplicates: false,
        }
    }
}

/// Which generative model API answers questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

/// Generation configuration
#[derive(Debug, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: GenerationProvider,

    /// Base URL (Gemini) or full chat completions URL (OpenAI);
    /// the provider's public endpoint when unset
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Model id; the provider's default model when unset
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after a failed call; 0 disables retries
    #[serde(default)]
    pub retry_attempts: usize,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_generation_provider() -> GenerationProvider { GenerationProvider::Gemini }
fn default_generation_timeout_ms() -> u64 { 30_000 }
fn default_retry_backoff_ms() -> u64 { 200 }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            api_url: None,
            api_key: None,
            model: None,
            timeout_ms: default_generation_timeout_ms(),
            retry_attempts: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: None,
        }
    }
}

impl GenerationConfig {
    /// Configured model, or the provider default
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, GenerationProvider::Gemini) => "gemini-1.5-flash",
            (None, GenerationProvider::OpenAi) => "gpt-4o-mini",
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> LogFormat { LogFormat::Pretty }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or from
    /// `school-assistant.toml` in the working directory when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        let config = config.apply_env_overrides(|key| std::env::var(key).ok());

        config.validate()?;
        debug!(
            "Configuration loaded: embedding={:?}, generation={:?} ({}), top_k={}",
            config.embedding.provider,
            config.generation.provider,
            config.generation.model(),
            config.retrieval.top_k
        );

        Ok(config)
    }

    /// Parse configuration from a TOML document, without environment layering
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fill unset credentials from the well-known provider variables
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.generation.api_key.is_none() {
            let key_var = match self.generation.provider {
                GenerationProvider::Gemini => "GEMINI_API_KEY",
                GenerationProvider::OpenAi => "OPENAI_API_KEY",
            };
            if let Some(key) = lookup(key_var) {
                self.generation.api_key = Some(SecretString::new(key));
            }
        }

        if self.generation.provider == GenerationProvider::Gemini && self.generation.model.is_none() {
            if let Some(model) = lookup("GEMINI_MODEL") {
                self.generation.model = Some(model);
            }
        }

        if self.embedding.api_key.is_none() {
            if let Some(key) = lookup("EMBEDDING_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
                self.embedding.api_key = Some(SecretString::new(key));
            }
        }

        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(AssistantError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProvider::Hashing && self.embedding.dimension == 0 {
            return Err(AssistantError::Config(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }

        if self.generation.timeout_ms == 0 || self.embedding.timeout_ms == 0 {
            return Err(AssistantError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if self.generation.model().trim().is_empty() {
            return Err(AssistantError::Config(
                "generation.model cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
