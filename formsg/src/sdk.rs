//! Entry point bundling the mode-selected key with decryption and webhook
//! authentication.

use ed25519_dalek::VerifyingKey;
use tracing::info;

use crate::attachments::AttachmentFetcher;
use crate::config::Config;
use crate::crypto::{Crypto, DecryptParams, DecryptedAttachments, DecryptedContent};
use crate::error::Result;
use crate::keys::{decode_verifying_key, Mode};
use crate::webhook::{SignatureHeader, Webhook};

/// FormSG consumer SDK.
#[derive(Debug, Clone)]
pub struct FormSdk {
    mode: Mode,
    crypto: Crypto,
    webhook: Webhook,
}

impl FormSdk {
    /// SDK trusting the published signing key for `mode`.
    pub fn new(mode: Mode) -> Result<Self> {
        Ok(Self::with_public_key(mode, mode.verifying_key()?))
    }

    /// SDK trusting an explicit signing key.
    pub fn with_public_key(mode: Mode, public_key: VerifyingKey) -> Self {
        Self {
            mode,
            crypto: Crypto::new(Some(public_key)),
            webhook: Webhook::new(public_key),
        }
    }

    /// SDK built from environment configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let public_key = match &config.signing_public_key {
            Some(encoded) => decode_verifying_key(encoded)?,
            None => config.mode.verifying_key()?,
        };

        info!(
            mode = ?config.mode,
            signing_key_override = config.signing_public_key.is_some(),
            tolerance_ms = config.signature_tolerance_ms,
            fetch_concurrency = config.attachment_fetch_concurrency,
            "formsg_sdk_configured"
        );

        let mut sdk = Self::with_public_key(config.mode, public_key);
        sdk.webhook = sdk.webhook.with_tolerance_ms(config.signature_tolerance_ms);
        sdk.crypto = sdk
            .crypto
            .with_fetch_concurrency(config.attachment_fetch_concurrency);
        Ok(sdk)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }

    pub fn webhook(&self) -> &Webhook {
        &self.webhook
    }

    /// Authenticate a webhook delivery against the registered `uri`.
    pub fn authenticate(&self, header: &str, uri: &str) -> Result<SignatureHeader> {
        self.webhook.authenticate(header, uri)
    }

    /// Decrypt a submission.
    pub fn decrypt(&self, form_secret_key: &str, params: &DecryptParams) -> Result<DecryptedContent> {
        self.crypto.decrypt(form_secret_key, params)
    }

    /// Decrypt a submission together with all of its attachments.
    pub async fn decrypt_attachments(
        &self,
        form_secret_key: &str,
        params: &DecryptParams,
        fetcher: &dyn AttachmentFetcher,
    ) -> Result<DecryptedAttachments> {
        self.crypto
            .decrypt_attachments(form_secret_key, params, fetcher)
            .await
    }
}
