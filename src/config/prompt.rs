use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use log::info;
use thiserror::Error;

pub const USER_QUERY_PLACEHOLDER: &str = "{user_query}";

const DEFAULT_GREETING: &str =
    "Welcome. I am the Strategy Architect. I can calculate your operational drag or discuss liquidity structures. What is your current challenge?";

const DEFAULT_PREAMBLE: &str =
    "Context: You are the AI assistant for Al Ameen Al Majali's personal brand website.
Tone: High-stakes real estate strategy, precise, architectural, authoritative.
Topics: Tokenization, Multi-Agent Systems (MAS), Margin Recovery, Real Estate Development in Dubai.
User Query: {user_query}";

const DEFAULT_APOLOGY: &str = "Connection to the strategic core interrupted. Please retry.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("Preamble template is missing the {{user_query}} placeholder")]
    PlaceholderMissing,
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Fixed copy the chat assistant speaks with. Any field left out of a
/// prompts file keeps its built-in value.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    pub greeting: String,
    pub preamble: String,
    pub apology: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            preamble: DEFAULT_PREAMBLE.to_string(),
            apology: DEFAULT_APOLOGY.to_string(),
        }
    }
}

impl PromptConfig {
    pub fn validate(&self) -> Result<(), PromptError> {
        if self.greeting.trim().is_empty() {
            return Err(PromptError::EmptyField("greeting"));
        }
        if self.apology.trim().is_empty() {
            return Err(PromptError::EmptyField("apology"));
        }
        if !self.preamble.contains(USER_QUERY_PLACEHOLDER) {
            return Err(PromptError::PlaceholderMissing);
        }
        Ok(())
    }

    /// Builds the full completion prompt around the raw user text.
    pub fn wrap(&self, user_text: &str) -> String {
        self.preamble.replace(USER_QUERY_PLACEHOLDER, user_text)
    }
}

pub fn parse_prompts(json: &str) -> Result<PromptConfig, PromptError> {
    let config: PromptConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config = parse_prompts(&file_content)?;
    info!("Loaded prompt overrides from '{}'", path);
    Ok(Arc::new(config))
}

/// Returns the prompts file at `path` when given, otherwise the defaults.
pub fn load_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => Ok(Arc::new(PromptConfig::default())),
    }
}
