use crate::config::prompt::PromptConfig;
use crate::models::websocket::{ClientMessage, ServerMessage};
use crate::session::{ChatSession, SessionState};
use crate::transport::ChatTransport;

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_stream::wrappers::WatchStream;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tokio_tungstenite::tungstenite::protocol::Message;

use log::{info, warn, error, debug};
use futures::{Sink, SinkExt, StreamExt};
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 64 * 1024;

type WsResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Serves the chat widget. Every connection gets its own `ChatSession`,
/// dropped when the socket closes.
pub async fn start_ws_server(
    addr: &str,
    transport: Arc<dyn ChatTransport>,
    prompts: Arc<PromptConfig>,
) -> WsResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS widget server listening on: {}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Incoming connection from: {}", peer);
        let transport = Arc::clone(&transport);
        let prompts = Arc::clone(&prompts);

        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws) => {
                    if let Err(e) = handle_connection(peer, ws, transport, prompts).await {
                        error!("Connection {} ended with error: {}", peer, e);
                    }
                }
                Err(e) => error!("Handshake failed for {}: {}", peer, e),
            }
        });
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ServerMessage) -> WsResult<()>
    where S: Sink<Message> + Unpin, S::Error: Error + Send + Sync + 'static
{
    let json = serde_json::to_string(frame)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

fn transcript(state: SessionState) -> ServerMessage {
    ServerMessage::Transcript {
        messages: state.messages,
        pending: state.pending,
    }
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    transport: Arc<dyn ChatTransport>,
    prompts: Arc<PromptConfig>,
) -> WsResult<()>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let session_id = Uuid::new_v4();
    info!("Opened chat session {} for {}", session_id, peer);

    let (mut tx, mut rx) = websocket.split();
    let session = ChatSession::new(transport, prompts);
    // Yields the current transcript first, then one item per change.
    let mut updates = WatchStream::new(session.subscribe());

    loop {
        tokio::select! {
            Some(state) = updates.next() => {
                send_frame(&mut tx, &transcript(state)).await?;
            }
            incoming = rx.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                };

                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let frame = ServerMessage::Error { message: "Message too large".to_string() };
                    send_frame(&mut tx, &frame).await?;
                    continue;
                }

                match message {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Chat { content }) => {
                            if session.submit(&content).is_none() {
                                debug!("Session {} ignored a submission", session_id);
                            }
                        }
                        Err(e) => {
                            let frame = ServerMessage::Error { message: format!("Invalid message: {}", e) };
                            send_frame(&mut tx, &frame).await?;
                        }
                    },
                    Message::Ping(payload) => tx.send(Message::Pong(payload)).await?,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    info!("Closed chat session {} for {}", session_id, peer);
    Ok(())
}
