//! Error taxonomy shared by decryption and webhook authentication.
//!
//! Every variant is a distinct outcome a caller may want to map to a
//! different external response, so failures are never collapsed into a
//! single generic error.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T, E = FormsgError> = std::result::Result<T, E>;

/// Errors produced by the crypto engine, attachment retriever and webhook
/// authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormsgError {
    /// Envelope or decrypted payload does not have the expected shape.
    #[error("content is malformed: {0}")]
    ContentMalformed(String),

    /// Authenticated decryption failed (wrong key or tampered ciphertext).
    #[error("decryption failed, check the form secret key and mode")]
    DecryptionFailed,

    /// Verified content was supplied but no signing public key is configured.
    #[error("a signing public key is required to verify verified content")]
    MissingSigningKey,

    /// Verified content did not carry a valid signature.
    #[error("verified content signature could not be verified")]
    VerificationFailed,

    /// `attachmentDownloadUrls` was not supplied.
    #[error("attachmentDownloadUrls was not supplied")]
    MissingAttachmentUrls,

    /// A download URL references a field that is not a non-empty attachment.
    #[error("attachment field {field_id} has no matching attachment answer")]
    AttachmentFieldMismatch { field_id: String },

    /// Fetching an encrypted attachment failed.
    #[error("failed to fetch attachment for field {field_id}: {reason}")]
    AttachmentFetchFailed { field_id: String, reason: String },

    /// A fetched attachment could not be decoded or decrypted.
    #[error("failed to decrypt attachment for field {field_id}")]
    AttachmentDecryptionFailed { field_id: String },

    /// Signature header is missing fields or cannot be parsed.
    #[error("X-FormSG-Signature header is malformed: {0}")]
    HeaderMalformed(String),

    /// Webhook signature does not verify against the registered uri.
    #[error("signature could not be verified for uri={uri} submission_id={submission_id} form_id={form_id} epoch={epoch}")]
    SignatureInvalid {
        uri: String,
        submission_id: String,
        form_id: String,
        epoch: u64,
    },

    /// Webhook signature is outside the freshness window.
    #[error("signature is not recent for submission_id={submission_id} epoch={epoch} (off by {age_ms}ms)")]
    SignatureExpired {
        submission_id: String,
        epoch: u64,
        age_ms: u64,
    },

    /// Form secret key is not base64 of 32 bytes.
    #[error("form secret key is invalid: {0}")]
    InvalidSecretKey(String),

    /// Signing public key is not a valid base64 Ed25519 key.
    #[error("signing public key is invalid: {0}")]
    InvalidPublicKey(String),
}

impl FormsgError {
    /// Webhook rejections (malformed header, bad signature, stale epoch).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::HeaderMalformed(_) | Self::SignatureInvalid { .. } | Self::SignatureExpired { .. }
        )
    }

    /// Failures that may succeed if the whole submission is retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AttachmentFetchFailed { .. })
    }

    /// Faults in how this process was configured rather than in the input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSigningKey | Self::InvalidSecretKey(_) | Self::InvalidPublicKey(_)
        )
    }

    /// Stable machine-readable code for responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContentMalformed(_) => "content_malformed",
            Self::DecryptionFailed => "decryption_failed",
            Self::MissingSigningKey => "missing_signing_key",
            Self::VerificationFailed => "verification_failed",
            Self::MissingAttachmentUrls => "missing_attachment_urls",
            Self::AttachmentFieldMismatch { .. } => "attachment_field_mismatch",
            Self::AttachmentFetchFailed { .. } => "attachment_fetch_failed",
            Self::AttachmentDecryptionFailed { .. } => "attachment_decryption_failed",
            Self::HeaderMalformed(_) => "header_malformed",
            Self::SignatureInvalid { .. } => "signature_invalid",
            Self::SignatureExpired { .. } => "signature_expired",
            Self::InvalidSecretKey(_) => "invalid_secret_key",
            Self::InvalidPublicKey(_) => "invalid_public_key",
        }
    }
}
