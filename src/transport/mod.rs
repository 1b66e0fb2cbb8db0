pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use self::http::HttpTransport;

/// Returned when the backend answers successfully but without any text.
pub const EMPTY_REPLY_FALLBACK: &str =
    "I processed the request but could not generate a textual response.";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid completion endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("API call failed with status: {status}")]
    Status {
        status: u16,
        detail: Option<String>,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One round trip to the completion backend. Implementations hold no
/// per-call state.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, prompt: &str) -> Result<String, TransportError>;
}
