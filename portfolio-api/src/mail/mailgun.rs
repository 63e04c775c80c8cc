//! Mailgun messages API transport.
//!
//! Reference: https://documentation.mailgun.com/docs/mailgun/api-reference/send/mailgun/messages

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use url::Url;

use super::{MailError, Mailer, OutgoingEmail};
use crate::config::MailConfig;

/// Longest error body kept for logging.
const ERROR_BODY_PREVIEW: usize = 500;

/// Sends email through `POST {api_url}/{domain}/messages`.
#[derive(Clone)]
pub struct MailgunMailer {
    client: Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl MailgunMailer {
    pub fn new(client: Client, config: &MailConfig, timeout: Duration) -> Result<Self, MailError> {
        let endpoint = Url::parse(&format!(
            "{}/{}/messages",
            config.api_url.trim_end_matches('/'),
            config.domain
        ))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Form fields for the messages API.
fn form_fields(email: &OutgoingEmail) -> [(&'static str, &str); 6] {
    [
        ("from", email.from.as_str()),
        ("to", email.to.as_str()),
        ("subject", email.subject.as_str()),
        ("text", email.text.as_str()),
        ("html", email.html.as_str()),
        ("h:Reply-To", email.reply_to.as_str()),
    ]
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            endpoint = %self.endpoint,
            text_length = email.text.len(),
            "mailgun_send_starting"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth("api", Some(&self.api_key))
            .timeout(self.timeout)
            .form(&form_fields(email)[..])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        info!(status = status.as_u16(), "mailgun_send_complete");

        Ok(())
    }
}
