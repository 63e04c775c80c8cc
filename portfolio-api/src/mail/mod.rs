//! Contact email delivery.
//!
//! This module provides:
//! - Composition of the notification email from validated contact fields
//! - The `Mailer` seam the web layer talks to
//! - A Mailgun HTTP API implementation of that seam

pub mod compose;
pub mod mailgun;

use async_trait::async_trait;
use thiserror::Error;

pub use compose::{compose_contact_email, escape_html, SanitizedContact};
pub use mailgun::MailgunMailer;

/// A fully composed outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Failure handing an email to the transport. Never shown to callers.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("mail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail service rejected message with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Email transport. One delivery attempt per call.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}
