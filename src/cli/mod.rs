pub mod chat;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_THINKING_BUDGET};
use crate::transport::http::DEFAULT_ENDPOINT;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON file overriding the assistant greeting, preamble and apology.
    #[arg(long, env = "PROMPTS_PATH", global = true)]
    pub prompts_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the completion proxy (and optionally the chat widget server).
    Serve(ServeArgs),
    /// Chat with the assistant from the terminal.
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the completion proxy to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Host address and port for the chat widget WebSocket server. Disabled when unset.
    #[arg(long, env = "WS_ADDR")]
    pub ws_addr: Option<String>,

    /// Completion endpoint used by widget sessions. Defaults to this server's own proxy.
    #[arg(long, env = "WIDGET_ENDPOINT")]
    pub widget_endpoint: Option<String>,

    // --- Completion provider Args ---
    /// API key for the hosted generation model. Requests fail with HTTP 500 while unset.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name for completions.
    #[arg(long, env = "CHAT_MODEL", default_value = DEFAULT_MODEL)]
    pub chat_model: String,

    /// Base URL of the generation API.
    #[arg(long, env = "CHAT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub chat_base_url: String,

    /// Thinking token budget sent with every completion. 0 disables the thinking config.
    #[arg(long, env = "THINKING_BUDGET", default_value_t = DEFAULT_THINKING_BUDGET)]
    pub thinking_budget: u32,

    // --- TLS Args ---
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}

impl ServeArgs {
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn thinking_budget(&self) -> Option<u32> {
        Some(self.thinking_budget).filter(|b| *b > 0)
    }

    /// Where widget sessions send prompts when no endpoint is given.
    pub fn widget_endpoint(&self) -> String {
        match &self.widget_endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint.clone(),
            _ => {
                let scheme = if self.enable_tls { "https" } else { "http" };
                format!("{}://{}{}", scheme, self.server_addr, crate::models::api::GENERATE_ROUTE)
            }
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Completion endpoint the terminal session posts prompts to.
    #[arg(long, env = "CHAT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let args = Args::try_parse_from(["strategic-core", "serve"]).unwrap();
        let Command::Serve(serve) = args.command else { panic!("expected serve") };
        assert_eq!(serve.server_addr, "127.0.0.1:3000");
        assert_eq!(serve.chat_model, DEFAULT_MODEL);
        assert_eq!(serve.thinking_budget(), Some(DEFAULT_THINKING_BUDGET));
        assert_eq!(serve.widget_endpoint(), "http://127.0.0.1:3000/api/generate");
    }

    #[test]
    fn zero_budget_disables_thinking() {
        let args = Args::try_parse_from(["strategic-core", "serve", "--thinking-budget", "0", "--api-key", " "]).unwrap();
        let Command::Serve(serve) = args.command else { panic!("expected serve") };
        assert_eq!(serve.thinking_budget(), None);
        assert_eq!(serve.api_key(), None);
    }

    #[test]
    fn chat_accepts_endpoint_and_global_prompts() {
        let args = Args::try_parse_from([
            "strategic-core",
            "chat",
            "--endpoint",
            "http://example.test/api/generate",
            "--prompts-path",
            "prompts.json",
        ]).unwrap();
        assert_eq!(args.prompts_path.as_deref(), Some("prompts.json"));
        let Command::Chat(chat) = args.command else { panic!("expected chat") };
        assert_eq!(chat.endpoint, "http://example.test/api/generate");
    }
}
