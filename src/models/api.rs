use serde::{ Serialize, Deserialize };

pub const GENERATE_ROUTE: &str = "/api/generate";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GenerateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { error: error.into(), details: Some(details.into()) }
    }
}
