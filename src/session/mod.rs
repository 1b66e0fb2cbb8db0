//! Chat session controller.
//!
//! A `ChatSession` owns one visible transcript and the in-flight guard for
//! it. `submit` appends the user turn immediately and resolves the
//! assistant turn on a spawned task; presentation layers observe progress
//! through `subscribe`.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::prompt::PromptConfig;
use crate::models::chat::ChatMessage;
use crate::transport::{ChatTransport, EMPTY_REPLY_FALLBACK};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
}

#[derive(Clone)]
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    prompts: Arc<PromptConfig>,
    state: Arc<watch::Sender<SessionState>>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>, prompts: Arc<PromptConfig>) -> Self {
        let initial = SessionState {
            messages: vec![ChatMessage::assistant(prompts.greeting.clone())],
            pending: false,
        };
        let (state, _) = watch::channel(initial);
        Self {
            transport,
            prompts,
            state: Arc::new(state),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.borrow().messages.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified after every transcript or pending change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolves once no transport call is outstanding.
    pub async fn settled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| !state.pending).await;
    }

    /// Starts a new turn. Returns `None` when the text is blank or another
    /// turn is still in flight; otherwise the handle of the task that will
    /// append the assistant reply.
    pub fn submit(&self, user_text: &str) -> Option<JoinHandle<()>> {
        if user_text.trim().is_empty() {
            debug!("Ignoring blank chat submission");
            return None;
        }

        let accepted = self.state.send_if_modified(|state| {
            if state.pending {
                return false;
            }
            state.messages.push(ChatMessage::user(user_text));
            state.pending = true;
            true
        });
        if !accepted {
            debug!("Ignoring chat submission while a reply is pending");
            return None;
        }

        let prompt = self.prompts.wrap(user_text);
        let transport = self.transport.clone();
        let mut turn = TurnGuard {
            state: self.state.clone(),
            apology: self.prompts.apology.clone(),
            reply: None,
        };

        Some(tokio::spawn(async move {
            match transport.send(&prompt).await {
                Ok(text) if text.is_empty() => turn.reply = Some(EMPTY_REPLY_FALLBACK.to_string()),
                Ok(text) => turn.reply = Some(text),
                Err(e) => warn!("Chat transport failed: {}", e),
            }
        }))
    }
}

/// Closes the turn opened by `submit` when dropped: appends the recorded
/// reply, or the apology when there is none, and clears `pending`. Dropping
/// also happens when the task panics or is aborted.
struct TurnGuard {
    state: Arc<watch::Sender<SessionState>>,
    apology: String,
    reply: Option<String>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let text = self.reply.take().unwrap_or_else(|| self.apology.clone());
        self.state.send_modify(|state| {
            state.messages.push(ChatMessage::assistant(text));
            state.pending = false;
        });
    }
}
