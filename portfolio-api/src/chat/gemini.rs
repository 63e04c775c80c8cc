//! Gemini `generateContent` client.
//!
//! Reference: https://ai.google.dev/api/generate-content

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use super::{ChatError, ChatMessage, ChatModel, Role, FALLBACK_REPLY};
use crate::config::ChatConfig;

/// Longest upstream error body kept for logging.
const ERROR_BODY_PREVIEW: usize = 500;

/// Gemini chat client. Cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiClient {
    /// Build a client for `{api_url}/models/{model}:generateContent`.
    pub fn new(client: Client, config: &ChatConfig, timeout: Duration) -> Result<Self, ChatError> {
        let endpoint = Url::parse(&format!(
            "{}/models/{}:generateContent",
            config.api_url.trim_end_matches('/'),
            config.model
        ))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request<'a>(&self, conversation: &'a [ChatMessage]) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: conversation
                .iter()
                .map(|turn| Content {
                    role: match turn.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    },
                    parts: vec![Part {
                        text: &turn.content,
                    }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn reply(&self, conversation: &[ChatMessage]) -> Result<String, ChatError> {
        info!(
            endpoint = %self.endpoint,
            turns = conversation.len(),
            "gemini_request_starting"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&self.build_request(conversation))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response.json().await?;

        match body.first_text() {
            Some(text) => {
                info!(reply_length = text.len(), "gemini_request_complete");
                Ok(text)
            }
            None => {
                warn!(candidates = body.candidates.len(), "gemini_reply_empty");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty.
    fn first_text(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .clone()
            .filter(|text| !text.is_empty())
    }
}
