//! Chat turn validation and history decoding.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{text, ValidationErrors};
use crate::chat::{ChatMessage, Role};

pub const MAX_CHAT_MESSAGE_CHARS: usize = 500;

pub const CHAT_MESSAGE_INVALID: &str = "Mensagem inválida";

/// Chat turn body as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub history: Option<Value>,
}

impl ChatRequest {
    /// Decode the most recent `limit` history turns.
    ///
    /// History is best-effort context: entries with an unknown role or
    /// non-text content are dropped, never coerced, and never fail the
    /// request.
    pub fn history(&self, limit: usize) -> Vec<ChatMessage> {
        let entries = match self.history.as_ref() {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                warn!("chat_history_not_array");
                return Vec::new();
            }
        };

        let decoded: Vec<ChatMessage> = entries.iter().filter_map(decode_turn).collect();

        let dropped = entries.len() - decoded.len();
        if dropped > 0 {
            warn!(
                dropped = dropped,
                total = entries.len(),
                "chat_history_entries_dropped"
            );
        }

        let skip = decoded.len().saturating_sub(limit);
        decoded.into_iter().skip(skip).collect()
    }
}

fn decode_turn(entry: &Value) -> Option<ChatMessage> {
    let role = entry.get("role").and_then(Value::as_str).and_then(Role::parse)?;
    let content = entry.get("content").and_then(Value::as_str)?;

    Some(ChatMessage {
        role,
        content: content.to_string(),
    })
}

/// Validate the user's message: present, textual and at most 500 characters.
pub fn validate_chat(request: &ChatRequest) -> Result<&str, ValidationErrors> {
    match text(&request.message) {
        Some(message) if message.chars().count() <= MAX_CHAT_MESSAGE_CHARS => Ok(message),
        _ => Err(ValidationErrors::single(CHAT_MESSAGE_INVALID)),
    }
}
