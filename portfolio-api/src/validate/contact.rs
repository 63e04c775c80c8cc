//! Contact form validation.

use serde::Deserialize;
use serde_json::Value;

use super::{text, ValidationErrors};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_MESSAGE_CHARS: usize = 10;
pub const MAX_MESSAGE_CHARS: usize = 5000;

pub const NAME_TOO_SHORT: &str = "Nome deve ter pelo menos 2 caracteres";
pub const EMAIL_REQUIRED: &str = "Email é obrigatório";
pub const EMAIL_INVALID: &str = "Email inválido";
pub const MESSAGE_TOO_SHORT: &str = "Mensagem deve ter pelo menos 10 caracteres";
pub const MESSAGE_TOO_LONG: &str = "Mensagem muito longa (máximo 5000 caracteres)";

/// Contact form body as submitted. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// Contact fields that passed validation, as submitted (not yet trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Validate a contact form, collecting every violated rule in order.
pub fn validate_contact(form: &ContactForm) -> Result<ContactFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = text(&form.name);
    if name.map_or(true, |n| n.trim().chars().count() < MIN_NAME_CHARS) {
        errors.push(NAME_TOO_SHORT);
    }

    let email = text(&form.email);
    match email {
        None => errors.push(EMAIL_REQUIRED),
        Some(e) if !is_valid_email(e) => errors.push(EMAIL_INVALID),
        Some(_) => {}
    }

    let message = text(&form.message);
    if message.map_or(true, |m| m.trim().chars().count() < MIN_MESSAGE_CHARS) {
        errors.push(MESSAGE_TOO_SHORT);
    }
    if message.map_or(false, |m| m.chars().count() > MAX_MESSAGE_CHARS) {
        errors.push(MESSAGE_TOO_LONG);
    }

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) => errors.into_result(ContactFields {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Basic `local@domain.tld` shape check.
///
/// Exactly one `@`, no whitespace, a non-empty local part, and a domain with
/// at least one dot that has characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}
