//! Reference webhook receiver.
//!
//! This module provides a thin web server that:
//! - Receives FormSG webhooks
//! - Authenticates the signature header against the registered URI
//! - Decrypts the submission, optionally with its attachments
//! - Responds with a summary and stores nothing

pub mod handlers;

pub use handlers::{
    formsg_webhook, health, status_for_error, AppState, HealthResponse, WebhookBody,
    WebhookResponse,
};
