//! Chat assistant module.
//!
//! This module provides:
//! - Conversation assembly (persona, acknowledgement, history, new message)
//! - The `ChatModel` seam the web layer talks to
//! - A Gemini `generateContent` implementation of that seam
//!
//! ## Flow
//!
//! ```text
//! ChatRequest → build_conversation() → ChatModel::reply() → reply text
//! ```

pub mod conversation;
pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use conversation::{
    build_conversation, ChatMessage, Role, ACKNOWLEDGEMENT, DEFAULT_PERSONA, FALLBACK_REPLY,
};
pub use gemini::GeminiClient;

/// Failure talking to the language model. Never shown to callers.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid chat endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat service returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// A language model that answers a role-tagged conversation.
///
/// Implementations make exactly one upstream attempt per call.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn reply(&self, conversation: &[ChatMessage]) -> Result<String, ChatError>;
}
