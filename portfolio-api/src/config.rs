//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables once at startup.
//! Collaborator credentials are optional: an endpoint whose credentials are
//! missing answers 500 instead of calling out.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default base URL for the Gemini REST API.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model used for chat replies.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default base URL for the Mailgun messages API.
pub const DEFAULT_MAILGUN_API_URL: &str = "https://api.mailgun.net/v3";

/// Quota and window for one endpoint's rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum admitted requests per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Mail account settings for the contact endpoint.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Mailgun API key
    pub api_key: String,
    /// Mailgun sending domain
    pub domain: String,
    /// Mailgun API base URL
    pub api_url: String,
    /// Sender address
    pub from: String,
    /// Recipient of contact submissions
    pub to: String,
}

/// Gemini settings for the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Gemini API key
    pub api_key: String,
    /// Gemini API base URL
    pub api_url: String,
    /// Model id
    pub model: String,
    /// Generation temperature
    pub temperature: f32,
    /// Generation output cap
    pub max_output_tokens: u32,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Mail settings, `None` when credentials are missing
    pub mail: Option<MailConfig>,

    /// Chat settings, `None` when the API key is missing
    pub chat: Option<ChatConfig>,

    /// Persona override for the chat assistant
    pub chat_system_prompt: Option<String>,

    /// Number of history turns forwarded upstream
    pub chat_history_limit: usize,

    /// Timeout for each call to the mail or chat service
    pub upstream_timeout: Duration,

    /// Contact form limiter policy
    pub contact_rate_limit: RateLimitPolicy,

    /// Chat limiter policy
    pub chat_rate_limit: RateLimitPolicy,

    /// Maximum tracked clients per limiter table
    pub rate_limit_max_clients: usize,

    /// Interval between expired-record sweeps
    pub rate_limit_sweep_interval: Duration,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            mail: None,
            chat: None,
            chat_system_prompt: None,
            chat_history_limit: 10,
            upstream_timeout: Duration::from_secs(15),
            contact_rate_limit: RateLimitPolicy::new(3, Duration::from_secs(60)),
            chat_rate_limit: RateLimitPolicy::new(10, Duration::from_secs(60)),
            rate_limit_max_clients: 10_000,
            rate_limit_sweep_interval: Duration::from_secs(60),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            mail: mail_from_env(),

            chat: chat_from_env(),

            chat_system_prompt: non_empty("CHAT_SYSTEM_PROMPT"),

            chat_history_limit: parse_or("CHAT_HISTORY_LIMIT", defaults.chat_history_limit),

            upstream_timeout: Duration::from_millis(parse_or("UPSTREAM_TIMEOUT_MS", 15_000)),

            contact_rate_limit: RateLimitPolicy::new(
                parse_or("CONTACT_RATE_LIMIT", defaults.contact_rate_limit.max_requests),
                Duration::from_secs(parse_or("CONTACT_RATE_WINDOW_SECS", 60)),
            ),

            chat_rate_limit: RateLimitPolicy::new(
                parse_or("CHAT_RATE_LIMIT", defaults.chat_rate_limit.max_requests),
                Duration::from_secs(parse_or("CHAT_RATE_WINDOW_SECS", 60)),
            ),

            rate_limit_max_clients: parse_or(
                "RATE_LIMIT_MAX_CLIENTS",
                defaults.rate_limit_max_clients,
            ),

            rate_limit_sweep_interval: Duration::from_secs(parse_or("RATE_LIMIT_SWEEP_SECS", 60)),

            max_body_bytes: parse_or("MAX_BODY_BYTES", defaults.max_body_bytes),
        }
    }
}

fn mail_from_env() -> Option<MailConfig> {
    let api_key = non_empty("MAILGUN_API_KEY");
    let domain = non_empty("MAILGUN_DOMAIN");

    let (api_key, domain) = match (api_key, domain) {
        (Some(key), Some(domain)) => (key, domain),
        (None, None) => return None,
        (key, domain) => {
            warn!(
                api_key_set = key.is_some(),
                domain_set = domain.is_some(),
                "mail_config_incomplete"
            );
            return None;
        }
    };

    let from = non_empty("MAIL_FROM").unwrap_or_else(|| format!("Portfolio <portfolio@{}>", domain));
    let to = non_empty("CONTACT_EMAIL").unwrap_or_else(|| from.clone());

    Some(MailConfig {
        api_key,
        api_url: non_empty("MAILGUN_API_URL")
            .unwrap_or_else(|| DEFAULT_MAILGUN_API_URL.to_string()),
        domain,
        from,
        to,
    })
}

fn chat_from_env() -> Option<ChatConfig> {
    let api_key = non_empty("GEMINI_API_KEY")?;

    Some(ChatConfig {
        api_key,
        api_url: non_empty("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
        model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        temperature: parse_or("CHAT_TEMPERATURE", 0.7),
        max_output_tokens: parse_or("CHAT_MAX_OUTPUT_TOKENS", 256),
    })
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable, falling back to `default` when unset or malformed.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match non_empty(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
