//! API endpoint handlers.
//!
//! Both endpoints follow the same gate:
//! 1. Identify the client from proxy headers
//! 2. Reject early when the endpoint quota is exhausted
//! 3. Decode and validate the body
//! 4. Make a single call to the collaborator (mailer or chat model)
//!
//! Throttled and invalid requests never reach a collaborator.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::chat::{build_conversation, ChatModel, GeminiClient, DEFAULT_PERSONA};
use crate::limiter::{client_fingerprint, client_identifier, RateLimiter};
use crate::mail::{compose_contact_email, MailgunMailer, Mailer};
use crate::validate::{validate_chat, validate_contact, ChatRequest, ContactForm, CHAT_MESSAGE_INVALID};
use crate::web::error::ApiError;
use crate::Config;

pub const CONTACT_THROTTLED: &str = "Muitas requisições. Aguarde um momento.";
pub const CONTACT_BODY_INVALID: &str = "Requisição inválida";
pub const CONTACT_NOT_CONFIGURED: &str =
    "Configuração de email não encontrada. Entre em contato diretamente.";
pub const CONTACT_SEND_FAILED: &str = "Erro ao enviar mensagem. Tente novamente mais tarde.";

pub const CHAT_THROTTLED: &str = "Muitas mensagens. Aguarde um momento.";
pub const CHAT_NOT_CONFIGURED: &str = "API não configurada";
pub const CHAT_UPSTREAM_FAILED: &str = "Erro ao processar mensagem";

pub const BODY_TOO_LARGE: &str = "Requisição muito grande";

/// Where contact notifications go.
#[derive(Clone)]
pub struct ContactDelivery {
    pub mailer: Arc<dyn Mailer>,
    pub from: String,
    pub to: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub contact_limiter: Arc<dyn RateLimiter>,
    pub chat_limiter: Arc<dyn RateLimiter>,
    pub contact: Option<ContactDelivery>,
    pub chat_model: Option<Arc<dyn ChatModel>>,
    pub persona: Arc<str>,
}

impl AppState {
    /// State with no collaborators; both endpoints answer "not configured"
    /// until one is attached.
    pub fn new(
        config: Config,
        contact_limiter: Arc<dyn RateLimiter>,
        chat_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let persona = config
            .chat_system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_PERSONA);

        Self {
            persona: Arc::from(persona),
            config: Arc::new(config),
            contact_limiter,
            chat_limiter,
            contact: None,
            chat_model: None,
        }
    }

    pub fn with_mailer(
        mut self,
        mailer: Arc<dyn Mailer>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.contact = Some(ContactDelivery {
            mailer,
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn with_chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Attach the Mailgun and Gemini clients for whichever credentials are
    /// configured.
    pub fn connect(self, client: reqwest::Client) -> Result<Self> {
        let config = Arc::clone(&self.config);
        let mut state = self;

        if let Some(mail) = &config.mail {
            let mailer = MailgunMailer::new(client.clone(), mail, config.upstream_timeout)
                .context("Failed to build Mailgun client")?;
            state = state.with_mailer(Arc::new(mailer), mail.from.clone(), mail.to.clone());
        }

        if let Some(chat) = &config.chat {
            let model = GeminiClient::new(client, chat, config.upstream_timeout)
                .context("Failed to build Gemini client")?;
            state = state.with_chat_model(Arc::new(model));
        }

        Ok(state)
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Contact Form
// =============================================================================

/// Contact success response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
}

/// Contact form endpoint.
///
/// Sends one notification email per admitted, valid submission.
pub async fn contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ContactResponse>, ApiError> {
    let client = client_identifier(&headers);
    let fingerprint = client_fingerprint(&client);

    if state.contact_limiter.is_limited(&client) {
        warn!(client = %fingerprint, "contact_rate_limited");
        return Err(ApiError::RateLimited(CONTACT_THROTTLED));
    }

    let form: ContactForm = decode_body(&body).map_err(|e| {
        warn!(client = %fingerprint, error = %e, "contact_body_invalid");
        ApiError::InvalidInput(CONTACT_BODY_INVALID.to_string())
    })?;

    let fields = validate_contact(&form).map_err(|errors| {
        info!(
            client = %fingerprint,
            violations = errors.messages().len(),
            "contact_validation_failed"
        );
        ApiError::InvalidInput(errors.to_string())
    })?;

    let delivery = state.contact.as_ref().ok_or_else(|| {
        error!("contact_mail_not_configured");
        ApiError::NotConfigured(CONTACT_NOT_CONFIGURED)
    })?;

    let email = compose_contact_email(&fields, &delivery.from, &delivery.to);

    delivery.mailer.send(&email).await.map_err(|e| {
        error!(client = %fingerprint, error = %e, "contact_send_failed");
        ApiError::Upstream(CONTACT_SEND_FAILED)
    })?;

    info!(client = %fingerprint, "contact_sent");

    Ok(Json(ContactResponse { success: true }))
}

// =============================================================================
// Chat
// =============================================================================

/// Chat success response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Chat endpoint.
///
/// Forwards the conversation to the model once; a failed call is a single
/// error response.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let client = client_identifier(&headers);
    let fingerprint = client_fingerprint(&client);

    if state.chat_limiter.is_limited(&client) {
        warn!(client = %fingerprint, "chat_rate_limited");
        return Err(ApiError::RateLimited(CHAT_THROTTLED));
    }

    let model = state.chat_model.as_ref().ok_or_else(|| {
        error!("chat_api_key_not_configured");
        ApiError::NotConfigured(CHAT_NOT_CONFIGURED)
    })?;

    let request: ChatRequest = decode_body(&body).map_err(|e| {
        warn!(client = %fingerprint, error = %e, "chat_body_invalid");
        ApiError::InvalidInput(CHAT_MESSAGE_INVALID.to_string())
    })?;

    let message = validate_chat(&request).map_err(|errors| {
        info!(client = %fingerprint, "chat_validation_failed");
        ApiError::InvalidInput(errors.to_string())
    })?;

    let history = request.history(state.config.chat_history_limit);
    let conversation = build_conversation(&state.persona, history, message);

    let reply = model.reply(&conversation).await.map_err(|e| {
        error!(client = %fingerprint, error = %e, "chat_upstream_failed");
        ApiError::Upstream(CHAT_UPSTREAM_FAILED)
    })?;

    info!(
        client = %fingerprint,
        turns = conversation.len(),
        reply_length = reply.len(),
        "chat_replied"
    );

    Ok(Json(ChatResponse { reply }))
}

/// Decode a JSON object body. An empty body decodes as an empty object.
///
/// Anything other than an object is rejected before field mapping; arrays are
/// never mapped onto fields by position.
fn decode_body<T: DeserializeOwned + Default>(body: &[u8]) -> serde_json::Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    match serde_json::from_slice(body)? {
        value @ Value::Object(_) => serde_json::from_value(value),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rewrite a bare 413 from the body limit into the JSON error envelope.
pub async fn payload_too_large_as_json(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(BODY_TOO_LARGE).into_response();
    }
    response
}
