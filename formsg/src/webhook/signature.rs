//! FormSG webhook signature verification.
//!
//! FormSG signs `{uri}.{submissionId}.{formId}.{epoch}` with Ed25519 and
//! sends the base64 signature in the `v1` field of the signature header.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, VerifyingKey, SIGNATURE_LENGTH};
use tracing::warn;

use super::header::SignatureHeader;

/// Default freshness window: five minutes either side of now.
pub const DEFAULT_TOLERANCE_MS: u64 = 300_000;

/// Verify the header signature over the base string for `uri`.
///
/// `uri` must be the statically registered webhook endpoint, not one derived
/// from the incoming request.
pub fn is_signature_valid(public_key: &VerifyingKey, uri: &str, header: &SignatureHeader) -> bool {
    let signature = match STANDARD.decode(&header.signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(
                submission_id = %header.submission_id,
                "webhook_signature_invalid_base64"
            );
            return false;
        }
    };

    let signature: [u8; SIGNATURE_LENGTH] = match signature.as_slice().try_into() {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(
                submission_id = %header.submission_id,
                signature_length = signature.len(),
                "webhook_signature_invalid_length"
            );
            return false;
        }
    };

    let base_string = header.base_string(uri);
    let valid = public_key
        .verify_strict(base_string.as_bytes(), &Signature::from_bytes(&signature))
        .is_ok();

    if !valid {
        warn!(
            submission_id = %header.submission_id,
            form_id = %header.form_id,
            epoch = header.epoch,
            uri_length = uri.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Milliseconds between `epoch` and `now_ms` if it exceeds `tolerance_ms`.
///
/// Symmetric: both stale and future-dated epochs are rejected.
pub fn epoch_age_if_expired(epoch: u64, now_ms: u64, tolerance_ms: u64) -> Option<u64> {
    let age = now_ms.abs_diff(epoch);

    if age > tolerance_ms {
        warn!(
            webhook_epoch = epoch,
            current_time = now_ms,
            age_ms = age,
            tolerance_ms = tolerance_ms,
            "webhook_signature_stale"
        );
        return Some(age);
    }

    None
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
