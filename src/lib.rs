pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod session;
pub mod transport;

use cli::{Args, Command, ServeArgs};
use config::prompt::{load_or_default, PromptConfig};
use llm::{gemini::GeminiClient, CompletionClient, LlmConfig};
use log::{info, warn};
use server::{api::AppState, Server, WidgetConfig};
use std::error::Error;
use std::sync::Arc;
use transport::{ChatTransport, HttpTransport};

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let prompts = load_or_default(args.prompts_path.as_deref())?;

    match &args.command {
        Command::Serve(serve) => run_server(serve, prompts).await,
        Command::Chat(chat) => cli::chat::run_chat(chat, prompts).await,
    }
}

async fn run_server(
    args: &ServeArgs,
    prompts: Arc<PromptConfig>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Thinking Budget: {:?}", args.thinking_budget());
    info!("TLS Enabled: {}", args.enable_tls);
    info!("Widget Address: {}", args.ws_addr.as_deref().unwrap_or("disabled"));
    info!("-------------------------");

    let llm_config = LlmConfig {
        api_key: args.api_key(),
        model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        thinking_budget: args.thinking_budget(),
    };
    let completion: Option<Arc<dyn CompletionClient>> = match GeminiClient::from_config(&llm_config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("{}; /api/generate will answer HTTP 500 until it is configured", e);
            None
        }
    };

    let tls = if args.enable_tls {
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => return Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into()),
        }
    } else {
        None
    };

    let widget = match &args.ws_addr {
        Some(addr) => {
            let endpoint = args.widget_endpoint();
            info!("Widget sessions post to: {}", endpoint);
            let transport: Arc<dyn ChatTransport> = Arc::new(HttpTransport::new(&endpoint)?);
            Some(WidgetConfig { addr: addr.clone(), transport, prompts })
        }
        None => None,
    };

    let server = Server::new(args.server_addr.clone(), AppState { completion }, tls, widget);
    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, LlmError};
    use crate::models::chat::ChatMessage;
    use async_trait::async_trait;

    struct Advisor;

    #[async_trait]
    impl CompletionClient for Advisor {
        async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
            if prompt.contains("User Query: How do I recover margin?") {
                Ok(CompletionResponse { text: Some("Consider MAS automation.".to_string()) })
            } else {
                Ok(CompletionResponse { text: None })
            }
        }

        fn model(&self) -> &str {
            "advisor"
        }
    }

    async fn spawn_proxy(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = server::api::router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/generate", addr)
    }

    #[tokio::test]
    async fn session_round_trip_through_proxy() {
        let endpoint = spawn_proxy(AppState { completion: Some(Arc::new(Advisor)) }).await;
        let prompts = Arc::new(PromptConfig::default());
        let session = session::ChatSession::new(Arc::new(HttpTransport::new(&endpoint).unwrap()), prompts.clone());

        session.submit("How do I recover margin?").unwrap().await.unwrap();
        assert_eq!(
            session.messages(),
            vec![
                ChatMessage::assistant(prompts.greeting.clone()),
                ChatMessage::user("How do I recover margin?"),
                ChatMessage::assistant("Consider MAS automation."),
            ]
        );

        session.submit("Something else").unwrap().await.unwrap();
        assert_eq!(session.messages()[4].text(), transport::EMPTY_REPLY_FALLBACK);
    }

    #[tokio::test]
    async fn unconfigured_proxy_yields_apology() {
        let endpoint = spawn_proxy(AppState { completion: None }).await;
        let prompts = Arc::new(PromptConfig::default());
        let session = session::ChatSession::new(Arc::new(HttpTransport::new(&endpoint).unwrap()), prompts.clone());

        session.submit("test").unwrap().await.unwrap();
        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text(), prompts.apology);
        assert!(!session.is_pending());
    }
}
