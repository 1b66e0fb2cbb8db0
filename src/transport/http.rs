use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client as HttpClient;
use url::Url;

use super::{ChatTransport, TransportError, EMPTY_REPLY_FALLBACK};
use crate::models::api::{ApiErrorBody, GenerateRequest, GenerateResponse};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/generate";

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self {
            http: HttpClient::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, prompt: &str) -> Result<String, TransportError> {
        debug!("POST {} ({} prompt bytes)", self.endpoint, prompt.len());
        let req = GenerateRequest { prompt: prompt.to_string() };
        let resp = self.http.post(self.endpoint.clone()).json(&req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .map(|e| e.details.unwrap_or(e.error));
            warn!("Completion backend returned {}: {:?}", status, detail);
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = resp.bytes().await?;
        let data: GenerateResponse = serde_json::from_slice(&bytes)?;
        Ok(data.text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string()))
    }
}
