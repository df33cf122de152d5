//! Fetching encrypted attachments from their download URLs.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing;

use crate::crypto::EncryptedAttachment;

/// Source of encrypted attachment bodies.
///
/// Implementations are shared across concurrent decrypt calls and must
/// tolerate concurrent invocation. Timeouts are the implementation's concern.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<EncryptedAttachment>;
}

/// Fetches attachments over HTTP(S) with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpAttachmentFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpAttachmentFetcher {
    /// Build a fetcher with its own pooled HTTP client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(16)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, timeout))
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    async fn fetch(&self, url: &str) -> Result<EncryptedAttachment> {
        tracing::debug!(
            url_length = url.len(),
            timeout_seconds = self.timeout.as_secs_f64(),
            "attachment_fetch_starting"
        );

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::error!(
                        timeout_seconds = self.timeout.as_secs_f64(),
                        error = %e,
                        "attachment_fetch_timeout"
                    );
                } else {
                    tracing::error!(error = %e, "attachment_fetch_error");
                }
                e
            })
            .context("Failed to send attachment request")?;

        let status = response.status().as_u16();
        let response = response
            .error_for_status()
            .with_context(|| format!("Attachment download returned status {status}"))?;

        let attachment = response
            .json::<EncryptedAttachment>()
            .await
            .context("Attachment response is not an encrypted file")?;

        tracing::debug!(
            status_code = status,
            binary_length = attachment.encrypted_file.binary.len(),
            "attachment_fetch_complete"
        );

        Ok(attachment)
    }
}
