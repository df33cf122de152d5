//! Submission decryption.
//!
//! Content, verified content and attachments are all sealed with a NaCl box
//! from a per-submission key pair to the form's key pair. Verified content is
//! additionally an Ed25519 signed message from FormSG.
//!
//! ## Decryption Flow
//!
//! ```text
//! encryptedContent → Envelope::parse → open_box → JSON FormField[]
//! verifiedContent  → Envelope::parse → open_box → verify signature → JSON claims
//! ```

pub mod envelope;
pub mod types;

use crypto_box::SecretKey;
use ed25519_dalek::{Signature, VerifyingKey, SIGNATURE_LENGTH};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::attachments::{self, AttachmentFetcher};
use crate::error::{FormsgError, Result};

pub use envelope::{decode_secret_key, open_attachment, open_box, Envelope};
pub use types::{
    Answer, AnswerArray, AttachmentBinary, DecryptParams, DecryptedAttachment,
    DecryptedAttachments, DecryptedContent, EncryptedAttachment, EncryptedFile, FieldType,
    FormField,
};

/// Default number of attachments fetched at once.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Decrypts submissions for any form whose secret key is supplied per call.
#[derive(Debug, Clone)]
pub struct Crypto {
    signing_public_key: Option<VerifyingKey>,
    fetch_concurrency: usize,
}

impl Crypto {
    /// Create a decryptor. Without a signing key, submissions carrying
    /// verified content are rejected with [`FormsgError::MissingSigningKey`].
    pub fn new(signing_public_key: Option<VerifyingKey>) -> Self {
        Self {
            signing_public_key,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Bound the number of concurrent attachment fetches (at least 1).
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    /// Decrypt a submission and, if present, its verified content.
    pub fn decrypt(&self, form_secret_key: &str, params: &DecryptParams) -> Result<DecryptedContent> {
        let secret_key = decode_secret_key(form_secret_key)?;
        self.decrypt_with_key(&secret_key, params)
    }

    /// Decrypt a single attachment binary into raw bytes.
    pub fn decrypt_file(&self, form_secret_key: &str, binary: &AttachmentBinary) -> Result<Vec<u8>> {
        let secret_key = decode_secret_key(form_secret_key)?;
        open_attachment(&secret_key, binary)
    }

    /// Decrypt a submission and every attachment named in
    /// `attachmentDownloadUrls`.
    ///
    /// Either all attachments are returned or none: the first fetch or
    /// decryption failure aborts the call.
    pub async fn decrypt_attachments(
        &self,
        form_secret_key: &str,
        params: &DecryptParams,
        fetcher: &dyn AttachmentFetcher,
    ) -> Result<DecryptedAttachments> {
        let download_urls = params
            .attachment_download_urls
            .as_ref()
            .ok_or(FormsgError::MissingAttachmentUrls)?;

        let secret_key = decode_secret_key(form_secret_key)?;
        let content = self.decrypt_with_key(&secret_key, params)?;

        let filenames = attachments::attachment_filenames(&content.responses);
        attachments::check_field_ids(download_urls, &filenames)?;

        let attachments = attachments::fetch_and_decrypt(
            &secret_key,
            download_urls,
            &filenames,
            fetcher,
            self.fetch_concurrency,
        )
        .await?;

        Ok(DecryptedAttachments {
            content,
            attachments,
        })
    }

    fn decrypt_with_key(&self, secret_key: &SecretKey, params: &DecryptParams) -> Result<DecryptedContent> {
        let plaintext = open_envelope(secret_key, &params.encrypted_content).map_err(|e| {
            if e == FormsgError::DecryptionFailed {
                warn!(
                    version = params.version,
                    "decrypt_failed_check_secret_key_and_mode"
                );
            }
            e
        })?;

        let responses: Vec<FormField> = serde_json::from_slice(&plaintext)
            .map_err(|e| FormsgError::ContentMalformed(format!("responses: {e}")))?;

        let verified = match &params.verified_content {
            Some(verified_content) => Some(self.decrypt_verified(secret_key, verified_content)?),
            None => None,
        };

        info!(
            version = params.version,
            field_count = responses.len(),
            has_verified = verified.is_some(),
            "decrypt_complete"
        );

        Ok(DecryptedContent {
            responses,
            verified,
        })
    }

    fn decrypt_verified(&self, secret_key: &SecretKey, verified_content: &str) -> Result<Map<String, Value>> {
        let verify_key = self
            .signing_public_key
            .as_ref()
            .ok_or(FormsgError::MissingSigningKey)?;

        let signed = open_envelope(secret_key, verified_content)?;
        let message = open_signed_message(&signed, verify_key)?;

        serde_json::from_slice(message)
            .map_err(|e| FormsgError::ContentMalformed(format!("verified content: {e}")))
    }
}

fn open_envelope(secret_key: &SecretKey, raw: &str) -> Result<Vec<u8>> {
    Envelope::parse(raw)?.open(secret_key)
}

/// Open a NaCl signed message (`signature || message`), returning the message.
fn open_signed_message<'a>(signed: &'a [u8], verify_key: &VerifyingKey) -> Result<&'a [u8]> {
    if signed.len() < SIGNATURE_LENGTH {
        warn!(signed_length = signed.len(), "verified_content_too_short");
        return Err(FormsgError::VerificationFailed);
    }

    let (signature, message) = signed.split_at(SIGNATURE_LENGTH);
    let signature: [u8; SIGNATURE_LENGTH] = signature
        .try_into()
        .map_err(|_| FormsgError::VerificationFailed)?;

    verify_key
        .verify_strict(message, &Signature::from_bytes(&signature))
        .map_err(|_| {
            warn!("verified_content_signature_mismatch");
            FormsgError::VerificationFailed
        })?;

    Ok(message)
}
