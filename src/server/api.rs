use crate::llm::{CompletionClient, LlmError};
use crate::models::api::{ApiErrorBody, GenerateRequest, GenerateResponse, GENERATE_ROUTE};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use log::{info, error};

const GENERATION_FAILED: &str = "Failed to generate content";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key was configured; every request then fails.
    pub completion: Option<Arc<dyn CompletionClient>>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(GENERATE_ROUTE, post(generate_handler).fallback(method_not_allowed))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    state: AppState,
    tls: Option<(String, String)>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(state);

    match tls {
        Some((cert_path, key_path)) => {
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &cert_path,
                &key_path
            ).await?;
            info!("Starting HTTPS completion proxy on: https://{}{}", addr, GENERATE_ROUTE);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("Starting HTTP completion proxy on: http://{}{}", addr, GENERATE_ROUTE);
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

fn failure(details: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorBody::with_details(GENERATION_FAILED, details)),
    ).into_response()
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, Json(ApiErrorBody::new("Method not allowed")))
}

async fn generate_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: GenerateRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            error!("Rejecting malformed generate request: {}", e);
            return failure(e.to_string());
        }
    };

    let Some(client) = state.completion.as_ref() else {
        error!("Generate request received but no API key is configured");
        return failure(LlmError::MissingApiKey.to_string());
    };

    match client.complete(&request.prompt).await {
        Ok(resp) => (StatusCode::OK, Json(GenerateResponse { text: resp.text })).into_response(),
        Err(e) => {
            error!("Completion API error ({}): {}", client.model(), e);
            failure(e.to_string())
        }
    }
}
