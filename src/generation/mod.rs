//! Generative model clients
//!
//! The pipeline only needs `generate(prompt) -> text`; each provider maps its
//! own wire format and failures onto [`GenerationError`].

pub mod gemini;
pub mod openai;
pub mod retry;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use retry::RetryPolicy;

use crate::config::{GenerationConfig, GenerationProvider};
use async_trait::async_trait;
use std::sync::Arc;

/// Text generation trait
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short provider name used in logs and metrics
    fn provider(&self) -> &str;

    /// Produce an answer for a fully composed prompt
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation API key is not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream error (status {status}): {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prompt was blocked: {0}")]
    Blocked(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl GenerationError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::RequestFailed(_) | GenerationError::Timeout(_) => true,
            GenerationError::UpstreamError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(err.to_string())
        } else {
            GenerationError::RequestFailed(err.to_string())
        }
    }

    /// Map a non-2xx response, preferring the provider's `error.message`
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or(body);

        GenerationError::UpstreamError { status, message }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Build the configured generation client
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>, GenerationError> {
    let generator: Arc<dyn Generator> = match config.provider {
        GenerationProvider::Gemini => Arc::new(GeminiClient::new(config)?),
        GenerationProvider::OpenAi => Arc::new(OpenAiClient::new(config)?),
    };
    Ok(generator)
}
