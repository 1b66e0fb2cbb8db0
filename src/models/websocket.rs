use serde::{ Serialize, Deserialize };

use super::chat::ChatMessage;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "transcript")] Transcript {
        messages: Vec<ChatMessage>,
        pending: bool,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
}
