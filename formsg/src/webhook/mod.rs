//! Webhook authentication.
//!
//! Each delivery passes through three stages and stops at the first failure:
//!
//! ```text
//! parse header → verify signature → check freshness → authenticated
//! ```
//!
//! Nothing is retried and no state is kept, so authenticating the same
//! header twice gives the same answer.

pub mod header;
pub mod signature;

use ed25519_dalek::VerifyingKey;
use tracing::{debug, warn};

use crate::error::{FormsgError, Result};

pub use header::{SignatureHeader, SIGNATURE_HEADER};
pub use signature::{epoch_age_if_expired, is_signature_valid, now_ms, DEFAULT_TOLERANCE_MS};

/// Authenticates FormSG webhook deliveries against one signing key.
#[derive(Debug, Clone)]
pub struct Webhook {
    public_key: VerifyingKey,
    tolerance_ms: u64,
}

impl Webhook {
    pub fn new(public_key: VerifyingKey) -> Self {
        Self {
            public_key,
            tolerance_ms: DEFAULT_TOLERANCE_MS,
        }
    }

    /// Override the freshness window.
    pub fn with_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.tolerance_ms = tolerance_ms;
        self
    }

    /// Authenticate a raw `X-FormSG-Signature` header for the registered `uri`.
    ///
    /// Returns the parsed header so callers can log submission and form ids.
    pub fn authenticate(&self, header: &str, uri: &str) -> Result<SignatureHeader> {
        self.authenticate_at(header, uri, now_ms())
    }

    /// [`Webhook::authenticate`] with an explicit current time.
    pub fn authenticate_at(&self, header: &str, uri: &str, now_ms: u64) -> Result<SignatureHeader> {
        let parsed: SignatureHeader = header.parse().map_err(|e| {
            warn!(header_length = header.len(), error = %e, "webhook_header_malformed");
            e
        })?;

        if !is_signature_valid(&self.public_key, uri, &parsed) {
            return Err(FormsgError::SignatureInvalid {
                uri: uri.to_string(),
                submission_id: parsed.submission_id,
                form_id: parsed.form_id,
                epoch: parsed.epoch,
            });
        }

        if let Some(age_ms) = epoch_age_if_expired(parsed.epoch, now_ms, self.tolerance_ms) {
            return Err(FormsgError::SignatureExpired {
                submission_id: parsed.submission_id,
                epoch: parsed.epoch,
                age_ms,
            });
        }

        debug!(
            submission_id = %parsed.submission_id,
            form_id = %parsed.form_id,
            "webhook_authenticated"
        );

        Ok(parsed)
    }
}
