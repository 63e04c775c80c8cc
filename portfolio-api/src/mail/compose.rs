//! Contact notification composition.

use super::OutgoingEmail;
use crate::validate::ContactFields;

/// Longest sender name carried into the email.
pub const MAX_NAME_CHARS: usize = 100;

/// Longest message body carried into the email.
pub const MAX_BODY_CHARS: usize = 5000;

const FOOTER: &str = "Enviado pelo formulário do portfolio";

/// Contact fields trimmed and capped for inclusion in an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl SanitizedContact {
    pub fn from_fields(fields: &ContactFields) -> Self {
        Self {
            name: fields.name.trim().chars().take(MAX_NAME_CHARS).collect(),
            email: fields.email.trim().to_lowercase(),
            message: fields.message.trim().chars().take(MAX_BODY_CHARS).collect(),
        }
    }
}

/// Build the notification email for a contact submission.
///
/// Replies go straight to the visitor's address.
pub fn compose_contact_email(fields: &ContactFields, from: &str, to: &str) -> OutgoingEmail {
    let contact = SanitizedContact::from_fields(fields);

    OutgoingEmail {
        from: from.to_string(),
        to: to.to_string(),
        reply_to: contact.email.clone(),
        subject: format!("[Portfolio] Nova mensagem de {}", contact.name),
        text: text_body(&contact),
        html: html_body(&contact),
    }
}

fn text_body(contact: &SanitizedContact) -> String {
    format!(
        "Nome: {}\nEmail: {}\n\nMensagem:\n{}\n\n---\n{}\n",
        contact.name, contact.email, contact.message, FOOTER
    )
}

fn html_body(contact: &SanitizedContact) -> String {
    let name = escape_html(&contact.name);
    let email = escape_html(&contact.email);
    let message = escape_html(&contact.message).replace('\n', "<br>");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #0F172A; color: #22C55E; padding: 20px; border-radius: 8px 8px 0 0; }}
    .content {{ background: #f8f9fa; padding: 20px; border-radius: 0 0 8px 8px; }}
    .field {{ margin-bottom: 15px; }}
    .label {{ font-weight: bold; color: #666; }}
    .value {{ margin-top: 5px; }}
    .message {{ background: white; padding: 15px; border-radius: 8px; border-left: 4px solid #22C55E; }}
    .footer {{ margin-top: 20px; font-size: 12px; color: #999; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h2 style="margin: 0;">Nova Mensagem do Portfolio</h2>
    </div>
    <div class="content">
      <div class="field">
        <div class="label">Nome:</div>
        <div class="value">{name}</div>
      </div>
      <div class="field">
        <div class="label">Email:</div>
        <div class="value"><a href="mailto:{email}">{email}</a></div>
      </div>
      <div class="field">
        <div class="label">Mensagem:</div>
        <div class="message">{message}</div>
      </div>
      <div class="footer">
        {footer}
      </div>
    </div>
  </div>
</body>
</html>
"#,
        name = name,
        email = email,
        message = message,
        footer = FOOTER,
    )
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
