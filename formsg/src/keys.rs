//! Signing public keys published by FormSG.
//!
//! FormSG signs webhooks and verified content with one Ed25519 key per
//! environment. The key is chosen once from the configured mode and passed by
//! value into [`crate::Crypto`] and [`crate::Webhook`].

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::VerifyingKey;

use crate::error::{FormsgError, Result};

/// Production signing public key.
pub const PUBLIC_KEY_PRODUCTION: &str = "3Tt8VduXsjjd4IrpdCd7BAkdZl/vUCstu9UvTX84FWw=";

/// Staging signing public key.
pub const PUBLIC_KEY_STAGING: &str = "rjv41kYqZwcbe3r6ymMEEKQ+Vd+DPuogN+Gzq3lP2Og=";

/// FormSG environment whose signing key should be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Staging,
    #[default]
    Production,
}

impl Mode {
    /// Parse a mode flag. Anything other than `staging` selects production.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("staging") {
            Mode::Staging
        } else {
            Mode::Production
        }
    }

    /// Base64 signing public key for this mode.
    pub fn signing_public_key(self) -> &'static str {
        match self {
            Mode::Staging => PUBLIC_KEY_STAGING,
            Mode::Production => PUBLIC_KEY_PRODUCTION,
        }
    }

    /// Decoded verify key for this mode.
    pub fn verifying_key(self) -> Result<VerifyingKey> {
        decode_verifying_key(self.signing_public_key())
    }
}

/// Decode a base64 Ed25519 public key.
pub fn decode_verifying_key(encoded: &str) -> Result<VerifyingKey> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| FormsgError::InvalidPublicKey(e.to_string()))?;

    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        FormsgError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
    })?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| FormsgError::InvalidPublicKey(e.to_string()))
}
