use std::error::Error;
use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::ChatArgs;
use crate::config::prompt::PromptConfig;
use crate::models::chat::{ChatMessage, Role};
use crate::session::ChatSession;
use crate::transport::HttpTransport;

fn render(message: &ChatMessage) -> String {
    match message.role() {
        Role::User => format!("you> {}", message.text()),
        Role::Assistant => format!("architect> {}", message.text()),
    }
}

/// Terminal front end for one chat session; ends on EOF.
pub async fn run_chat(
    args: &ChatArgs,
    prompts: Arc<PromptConfig>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let transport = HttpTransport::new(&args.endpoint)?;
    info!("Terminal chat posting to {}", transport.endpoint());
    let session = ChatSession::new(Arc::new(transport), prompts);

    let mut stdout = tokio::io::stdout();
    let mut shown = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let messages = session.messages();
        for message in messages.iter().skip(shown).filter(|m| m.role() == Role::Assistant) {
            stdout.write_all(format!("{}\n", render(message)).as_bytes()).await?;
        }
        shown = messages.len();
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if let Some(turn) = session.submit(&line) {
            stdout.write_all(b"Calculating...\n").await?;
            stdout.flush().await?;
            if let Err(e) = turn.await {
                warn!("Chat turn task failed: {}", e);
            }
        }
    }

    stdout.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_by_role() {
        assert_eq!(render(&ChatMessage::user("hi")), "you> hi");
        assert_eq!(render(&ChatMessage::assistant("hello")), "architect> hello");
    }
}
