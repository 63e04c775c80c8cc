//! Portfolio API - contact form mailer and chat assistant backend.
//!
//! This library provides the modules behind the `portfolio-api` binary:
//! - `limiter`: per-client fixed-window admission keyed by proxy headers
//! - `validate`: request body schemas and validation rules
//! - `mail`: contact notification composition and delivery
//! - `chat`: conversation assembly and the language model client
//! - `web`: the axum router and handlers tying them together
//!
//! ## Request Flow
//!
//! ```text
//! Request → client_identifier → RateLimiter → validate → Mailer / ChatModel → JSON
//! ```

pub mod chat;
pub mod config;
pub mod limiter;
pub mod mail;
pub mod validate;
pub mod web;

// Re-export commonly used types
pub use chat::{ChatModel, GeminiClient};
pub use config::Config;
pub use limiter::{FixedWindowLimiter, RateLimiter};
pub use mail::{MailgunMailer, Mailer};
pub use web::{router, AppState};
