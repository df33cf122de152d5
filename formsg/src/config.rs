//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables, falling back to
//! defaults when a variable is unset or cannot be parsed.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::crypto::DEFAULT_FETCH_CONCURRENCY;
use crate::keys::Mode;
use crate::webhook::DEFAULT_TOLERANCE_MS;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Which FormSG signing key to trust
    pub mode: Mode,

    /// Base64 signing public key overriding the mode's published key
    pub signing_public_key: Option<String>,

    /// Webhook endpoint URI exactly as registered with FormSG
    pub webhook_uri: Option<String>,

    /// Base64 form secret key
    pub form_secret_key: Option<String>,

    /// Maximum distance in milliseconds between a signature epoch and now
    pub signature_tolerance_ms: u64,

    /// Whether the receiver also downloads and decrypts attachments
    pub fetch_attachments: bool,

    /// Maximum number of attachments fetched concurrently
    pub attachment_fetch_concurrency: usize,

    /// HTTP request timeout in milliseconds for attachment downloads
    pub request_timeout_ms: u64,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Production,
            signing_public_key: None,
            webhook_uri: None,
            form_secret_key: None,
            signature_tolerance_ms: DEFAULT_TOLERANCE_MS,
            fetch_attachments: false,
            attachment_fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            request_timeout_ms: 8000,
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            mode: env::var("FORMSG_MODE")
                .map(|v| Mode::parse(&v))
                .unwrap_or(defaults.mode),

            signing_public_key: parse_optional("FORMSG_SIGNING_PUBLIC_KEY"),

            webhook_uri: parse_optional("FORMSG_WEBHOOK_URI"),

            form_secret_key: parse_optional("FORM_SECRET_KEY"),

            signature_tolerance_ms: parse_or(
                "FORMSG_SIGNATURE_TOLERANCE_MS",
                defaults.signature_tolerance_ms,
            ),

            fetch_attachments: parse_or("FORMSG_FETCH_ATTACHMENTS", defaults.fetch_attachments),

            attachment_fetch_concurrency: parse_or(
                "ATTACHMENT_FETCH_CONCURRENCY",
                defaults.attachment_fetch_concurrency,
            )
            .max(1),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),

            port: parse_or("PORT", defaults.port),
        }
    }
}

// Secrets stay out of debug output and logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mode", &self.mode)
            .field("signing_public_key", &self.signing_public_key)
            .field("webhook_uri", &self.webhook_uri)
            .field("form_secret_key", &self.form_secret_key.as_ref().map(|_| "<redacted>"))
            .field("signature_tolerance_ms", &self.signature_tolerance_ms)
            .field("fetch_attachments", &self.fetch_attachments)
            .field("attachment_fetch_concurrency", &self.attachment_fetch_concurrency)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("port", &self.port)
            .finish()
    }
}

/// Parse an environment variable, warning and using `default` if it is invalid.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read a non-empty environment variable.
fn parse_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
