//! Request body schemas and validation.
//!
//! Bodies are decoded into loosely typed schemas first (every field optional
//! and untyped) so that a wrong type produces a validation message rather
//! than a decoding failure. Validation then yields typed, trusted fields.
//!
//! Both validators are pure functions of their input.

pub mod chat;
pub mod contact;

use std::fmt;

use serde_json::Value;

pub use chat::{validate_chat, ChatRequest, CHAT_MESSAGE_INVALID, MAX_CHAT_MESSAGE_CHARS};
pub use contact::{
    is_valid_email, validate_contact, ContactFields, ContactForm, EMAIL_INVALID, EMAIL_REQUIRED,
    MAX_MESSAGE_CHARS, MESSAGE_TOO_LONG, MESSAGE_TOO_SHORT, MIN_MESSAGE_CHARS, MIN_NAME_CHARS,
    NAME_TOO_SHORT,
};

/// Ordered list of violated rules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    messages: Vec<&'static str>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(message: &'static str) -> Self {
        Self {
            messages: vec![message],
        }
    }

    pub fn push(&mut self, message: &'static str) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[&'static str] {
        &self.messages
    }

    /// Convert into `Ok(value)` when no rule was violated.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Non-empty string content of an optional JSON field.
///
/// Mirrors the "present and textual" check: missing, `null`, non-string and
/// empty values all count as absent.
pub(crate) fn text(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str).filter(|s| !s.is_empty())
}
