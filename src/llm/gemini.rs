use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionResponse, LlmConfig, LlmError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    message: String,
}

impl GenerateContentResponse {
    /// Joins the visible text parts of the first candidate, skipping thoughts.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
    thinking_budget: Option<u32>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        thinking_budget: Option<u32>
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        Ok(Self {
            http: HttpClient::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            thinking_budget,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        Self::new(api_key, config.model.clone(), config.base_url.clone(), config.thinking_budget)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let payload = GenerateContentRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: self.thinking_budget.map(|budget| GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: budget },
            }),
        };
        info!(
            "GeminiClient::complete() → model={} thinking_budget={:?}",
            self.model,
            self.thinking_budget
        );

        let resp = self.http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api { status: status.as_u16(), message });
        }

        let data = resp.json::<GenerateContentResponse>().await?;
        Ok(CompletionResponse { text: data.text() })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json,
        Router,
    };
    use serde_json::{json, Value};

    async fn spawn_fake(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn fake_generate(
        Path(model): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>
    ) -> impl IntoResponse {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": { "code": 403, "message": "bad key", "status": "PERMISSION_DENIED" } })),
            );
        }
        let budget = body["generationConfig"]["thinkingConfig"]["thinkingBudget"].clone();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default().to_string();
        (
            StatusCode::OK,
            Json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "hidden reasoning", "thought": true },
                            { "text": format!("{model}|{budget}|") },
                            { "text": prompt }
                        ]
                    }
                }]
            })),
        )
    }

    fn router() -> Router {
        Router::new().route("/v1beta/models/{model}", post(fake_generate))
    }

    #[tokio::test]
    async fn sends_key_and_thinking_budget() {
        let base = spawn_fake(router()).await;
        let client = GeminiClient::new("secret".into(), "gemini-test".into(), base, Some(32768)).unwrap();
        let resp = client.complete("hello").await.unwrap();
        assert_eq!(resp.text.as_deref(), Some("gemini-test:generateContent|32768|hello"));
    }

    #[tokio::test]
    async fn api_error_surfaces_message() {
        let base = spawn_fake(router()).await;
        let client = GeminiClient::new("wrong".into(), "gemini-test".into(), base, None).unwrap();
        match client.complete("hello").await.unwrap_err() {
            LlmError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(GeminiClient::from_config(&config), Err(LlmError::MissingApiKey)));
        let blank = LlmConfig { api_key: Some("  ".into()), ..LlmConfig::default() };
        assert!(matches!(GeminiClient::from_config(&blank), Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn no_text_parts_yields_none() {
        let data: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "thinking", "thought": true }] } }]
        })).unwrap();
        assert_eq!(data.text(), None);
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), None);
    }
}
