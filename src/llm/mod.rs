pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_THINKING_BUDGET: u32 = 32768;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API_KEY is not set in environment variables")]
    MissingApiKey,
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Completion API returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// `None` when the model produced no textual output.
    pub text: Option<String>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub thinking_budget: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
        }
    }
}
