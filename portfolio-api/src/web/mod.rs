//! Web server module for the portfolio API.
//!
//! This module provides a small JSON API that:
//! - Accepts contact form submissions and forwards them by email
//! - Answers chat turns through the configured language model
//! - Throttles each endpoint per client with its own fixed-window limiter

pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub use error::{ApiError, ErrorResponse};
pub use handlers::{
    chat, contact, health, payload_too_large_as_json, AppState, ChatResponse, ContactDelivery, ContactResponse,
    HealthResponse,
};

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/contact", post(contact))
        .route("/api/chat", post(chat))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(payload_too_large_as_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::handlers::{
        BODY_TOO_LARGE, CHAT_NOT_CONFIGURED, CHAT_THROTTLED, CHAT_UPSTREAM_FAILED,
        CONTACT_BODY_INVALID, CONTACT_NOT_CONFIGURED, CONTACT_SEND_FAILED, CONTACT_THROTTLED,
    };
    use super::*;
    use crate::chat::{ChatError, ChatMessage, ChatModel, Role, ACKNOWLEDGEMENT};
    use crate::config::{Config, RateLimitPolicy};
    use crate::limiter::FixedWindowLimiter;
    use crate::mail::{MailError, Mailer, OutgoingEmail};
    use crate::validate::{
        CHAT_MESSAGE_INVALID, EMAIL_INVALID, MESSAGE_TOO_SHORT, NAME_TOO_SHORT,
    };

    // =========================================================================
    // Fakes
    // =========================================================================

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                return Err(MailError::Rejected {
                    status: 401,
                    body: "Forbidden: key-secret".to_string(),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingModel {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
        fail: bool,
    }

    impl RecordingModel {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn reply(&self, conversation: &[ChatMessage]) -> Result<String, ChatError> {
            self.calls.lock().unwrap().push(conversation.to_vec());
            if self.fail {
                return Err(ChatError::Upstream {
                    status: 500,
                    body: "internal upstream detail".to_string(),
                });
            }
            Ok("Olá! Posso ajudar.".to_string())
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn base_state(config: Config) -> AppState {
        let contact = Arc::new(FixedWindowLimiter::new(
            "contact",
            config.contact_rate_limit,
            config.rate_limit_max_clients,
        ));
        let chat = Arc::new(FixedWindowLimiter::new(
            "chat",
            config.chat_rate_limit,
            config.rate_limit_max_clients,
        ));
        AppState::new(config, contact, chat)
    }

    fn state_with(mailer: Arc<RecordingMailer>, model: Arc<RecordingModel>) -> AppState {
        base_state(Config::default())
            .with_mailer(mailer, "portfolio@mg.example.com", "owner@example.com")
            .with_chat_model(model)
    }

    fn post(uri: &str, ip: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn valid_contact() -> Value {
        json!({
            "name": "Ana Silva",
            "email": "ana@example.com",
            "message": "This is a valid message body."
        })
    }

    // =========================================================================
    // Health
    // =========================================================================

    #[tokio::test]
    async fn test_health() {
        let app = router(base_state(Config::default()));
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    // =========================================================================
    // Contact
    // =========================================================================

    #[tokio::test]
    async fn test_contact_success_sends_email() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = router(state_with(mailer.clone(), Arc::new(RecordingModel::default())));

        let (status, body) = send(&app, post("/api/contact", "203.0.113.1", valid_contact())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "portfolio@mg.example.com");
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].reply_to, "ana@example.com");
        assert_eq!(sent[0].subject, "[Portfolio] Nova mensagem de Ana Silva");
    }

    #[tokio::test]
    async fn test_contact_fourth_request_is_throttled() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = router(state_with(mailer.clone(), Arc::new(RecordingModel::default())));

        for _ in 0..3 {
            let (status, _) =
                send(&app, post("/api/contact", "203.0.113.2", valid_contact())).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, post("/api/contact", "203.0.113.2", valid_contact())).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({ "error": CONTACT_THROTTLED }));
        assert_eq!(mailer.sent().len(), 3);

        // Another client is unaffected.
        let (status, _) = send(&app, post("/api/contact", "203.0.113.3", valid_contact())).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_contact_validation_lists_every_violation() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = router(state_with(mailer.clone(), Arc::new(RecordingModel::default())));

        let (status, body) = send(
            &app,
            post(
                "/api/contact",
                "203.0.113.4",
                json!({ "name": "A", "email": "bad", "message": "short" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "error": format!("{}, {}, {}", NAME_TOO_SHORT, EMAIL_INVALID, MESSAGE_TOO_SHORT)
            })
        );
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_contact_invalid_requests_count_against_quota() {
        let app = router(state_with(
            Arc::new(RecordingMailer::default()),
            Arc::new(RecordingModel::default()),
        ));

        for _ in 0..3 {
            let (status, _) =
                send(&app, post("/api/contact", "203.0.113.5", json!({}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, _) = send(&app, post("/api/contact", "203.0.113.5", valid_contact())).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_contact_malformed_json_is_bad_request() {
        let app = router(state_with(
            Arc::new(RecordingMailer::default()),
            Arc::new(RecordingModel::default()),
        ));
        let request = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": CONTACT_BODY_INVALID }));
    }

    #[tokio::test]
    async fn test_contact_not_configured() {
        let app = router(base_state(Config::default()));

        let (status, body) = send(&app, post("/api/contact", "203.0.113.6", valid_contact())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": CONTACT_NOT_CONFIGURED }));
    }

    #[tokio::test]
    async fn test_contact_transport_failure_is_opaque() {
        let mailer = Arc::new(RecordingMailer::failing());
        let app = router(state_with(mailer.clone(), Arc::new(RecordingModel::default())));

        let (status, body) = send(&app, post("/api/contact", "203.0.113.7", valid_contact())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": CONTACT_SEND_FAILED }));
        assert!(!body.to_string().contains("key-secret"));
        // One attempt, no retry.
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_contact_body_limit() {
        let config = Config {
            max_body_bytes: 128,
            ..Config::default()
        };
        let app = router(
            base_state(config).with_mailer(
                Arc::new(RecordingMailer::default()),
                "from@example.com",
                "to@example.com",
            ),
        );
        let big = json!({
            "name": "Ana",
            "email": "ana@example.com",
            "message": "x".repeat(1024)
        });

        let mut request = post("/api/contact", "203.0.113.8", big.clone());
        request.headers_mut().insert(
            "content-length",
            big.to_string().len().to_string().parse().unwrap(),
        );

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({ "error": BODY_TOO_LARGE }));
    }

    #[tokio::test]
    async fn test_contact_array_body_is_bad_request() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = router(state_with(mailer.clone(), Arc::new(RecordingModel::default())));

        let array = json!(["Ana Silva", "ana@example.com", "This is a valid message body."]);
        let (status, body) = send(&app, post("/api/contact", "203.0.113.9", array)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": CONTACT_BODY_INVALID }));
        assert!(mailer.sent().is_empty());
    }

    // =========================================================================
    // Chat
    // =========================================================================

    #[tokio::test]
    async fn test_chat_reply() {
        let model = Arc::new(RecordingModel::default());
        let app = router(state_with(Arc::new(RecordingMailer::default()), model.clone()));

        let (status, body) = send(
            &app,
            post(
                "/api/chat",
                "198.51.100.1",
                json!({
                    "message": "Quanto custa um site?",
                    "history": [
                        { "role": "assistant", "content": "Olá! Como posso ajudar?" },
                        { "role": "bogus", "content": "dropped" }
                    ]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "reply": "Olá! Posso ajudar." }));

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        let turns = &calls[0];
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1], ChatMessage::assistant(ACKNOWLEDGEMENT));
        assert_eq!(turns[2], ChatMessage::assistant("Olá! Como posso ajudar?"));
        assert_eq!(turns[3], ChatMessage::user("Quanto custa um site?"));
    }

    #[tokio::test]
    async fn test_chat_uses_configured_persona() {
        let config = Config {
            chat_system_prompt: Some("Custom persona".to_string()),
            ..Config::default()
        };
        let model = Arc::new(RecordingModel::default());
        let app = router(base_state(config).with_chat_model(model.clone()));

        let (status, _) =
            send(&app, post("/api/chat", "198.51.100.2", json!({ "message": "Oi" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(model.calls()[0][0], ChatMessage::user("Custom persona"));
    }

    #[tokio::test]
    async fn test_chat_message_length() {
        let model = Arc::new(RecordingModel::default());
        let app = router(state_with(Arc::new(RecordingMailer::default()), model.clone()));

        let (status, _) = send(
            &app,
            post("/api/chat", "198.51.100.3", json!({ "message": "a".repeat(500) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            post("/api/chat", "198.51.100.3", json!({ "message": "a".repeat(501) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": CHAT_MESSAGE_INVALID }));

        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_throttled_after_quota() {
        let config = Config {
            chat_rate_limit: RateLimitPolicy::new(2, Duration::from_secs(60)),
            ..Config::default()
        };
        let model = Arc::new(RecordingModel::default());
        let app = router(base_state(config).with_chat_model(model.clone()));

        for _ in 0..2 {
            let (status, _) =
                send(&app, post("/api/chat", "198.51.100.4", json!({ "message": "Oi" }))).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) =
            send(&app, post("/api/chat", "198.51.100.4", json!({ "message": "Oi" }))).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({ "error": CHAT_THROTTLED }));
        assert_eq!(model.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_endpoints_have_separate_quotas() {
        let app = router(state_with(
            Arc::new(RecordingMailer::default()),
            Arc::new(RecordingModel::default()),
        ));

        for _ in 0..3 {
            send(&app, post("/api/contact", "192.0.2.1", valid_contact())).await;
        }
        let (status, _) = send(&app, post("/api/contact", "192.0.2.1", valid_contact())).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _) =
            send(&app, post("/api/chat", "192.0.2.1", json!({ "message": "Oi" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_array_body_is_bad_request() {
        let model = Arc::new(RecordingModel::default());
        let app = router(state_with(Arc::new(RecordingMailer::default()), model.clone()));

        let (status, body) = send(&app, post("/api/chat", "198.51.100.9", json!(["Oi"]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": CHAT_MESSAGE_INVALID }));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_chat_not_configured() {
        let app = router(base_state(Config::default()));

        let (status, body) =
            send(&app, post("/api/chat", "198.51.100.5", json!({ "message": "Oi" }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": CHAT_NOT_CONFIGURED }));
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_opaque() {
        let model = Arc::new(RecordingModel::failing());
        let app = router(state_with(Arc::new(RecordingMailer::default()), model.clone()));

        let (status, body) =
            send(&app, post("/api/chat", "198.51.100.6", json!({ "message": "Oi" }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": CHAT_UPSTREAM_FAILED }));
        assert!(!body.to_string().contains("upstream detail"));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_requests_without_proxy_headers_share_unknown_bucket() {
        let config = Config {
            chat_rate_limit: RateLimitPolicy::new(1, Duration::from_secs(60)),
            ..Config::default()
        };
        let app = router(base_state(config).with_chat_model(Arc::new(RecordingModel::default())));

        let anonymous = || {
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .body(Body::from(r#"{"message":"Oi"}"#))
                .unwrap()
        };

        let (first, _) = send(&app, anonymous()).await;
        let (second, _) = send(&app, anonymous()).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    }
}
