//! Envelope decoding and NaCl box opening.
//!
//! Envelope wire format:
//!   `base64(submission public key, 32 bytes);base64(nonce, 24 bytes):base64(ciphertext)`

use base64::{engine::general_purpose::STANDARD, Engine};
use crypto_box::{aead::Aead, Nonce, PublicKey, SalsaBox, SecretKey};

use super::types::{AttachmentBinary, EncryptedFile};
use crate::error::{FormsgError, Result};

/// A parsed `pubkey;nonce:ciphertext` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub submission_public_key: [u8; 32],
    pub nonce: [u8; 24],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Parse an envelope string, checking key and nonce lengths.
    pub fn parse(raw: &str) -> Result<Self> {
        let (public_key, rest) = raw
            .split_once(';')
            .ok_or_else(|| malformed("envelope is missing ';'"))?;
        let (nonce, ciphertext) = rest
            .split_once(':')
            .ok_or_else(|| malformed("envelope is missing ':'"))?;

        if public_key.contains(':') || rest.contains(';') || ciphertext.contains(':') {
            return Err(malformed("envelope must have exactly three parts"));
        }

        Ok(Envelope {
            submission_public_key: decode_fixed(public_key, "submission public key")?,
            nonce: decode_fixed(nonce, "nonce")?,
            ciphertext: decode(ciphertext, "ciphertext")?,
        })
    }

    /// Open the envelope with the form secret key.
    pub fn open(&self, secret_key: &SecretKey) -> Result<Vec<u8>> {
        open_box(
            secret_key,
            &self.submission_public_key,
            &self.nonce,
            &self.ciphertext,
        )
    }
}

impl TryFrom<&EncryptedFile> for AttachmentBinary {
    type Error = FormsgError;

    fn try_from(file: &EncryptedFile) -> Result<Self> {
        Ok(AttachmentBinary {
            submission_public_key: decode_fixed(&file.submission_public_key, "submission public key")?,
            nonce: decode_fixed(&file.nonce, "nonce")?,
            ciphertext: decode(&file.binary, "binary")?,
        })
    }
}

/// Decode the base64 form secret key.
pub fn decode_secret_key(encoded: &str) -> Result<SecretKey> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| FormsgError::InvalidSecretKey(e.to_string()))?;

    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        FormsgError::InvalidSecretKey(format!("expected 32 bytes, got {}", bytes.len()))
    })?;

    Ok(SecretKey::from(bytes))
}

/// Authenticated decryption with the X25519/XSalsa20-Poly1305 box.
///
/// Returns no plaintext at all unless the Poly1305 tag verifies.
pub fn open_box(
    secret_key: &SecretKey,
    submission_public_key: &[u8; 32],
    nonce: &[u8; 24],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let public_key = PublicKey::from(*submission_public_key);
    let salsa_box = SalsaBox::new(&public_key, secret_key);

    salsa_box
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| FormsgError::DecryptionFailed)
}

/// Open a decoded attachment binary with the form secret key.
pub fn open_attachment(secret_key: &SecretKey, binary: &AttachmentBinary) -> Result<Vec<u8>> {
    open_box(
        secret_key,
        &binary.submission_public_key,
        &binary.nonce,
        &binary.ciphertext,
    )
}

fn decode(encoded: &str, what: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| malformed(&format!("{what} is not valid base64: {e}")))
}

fn decode_fixed<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N]> {
    let bytes = decode(encoded, what)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| malformed(&format!("{what} must be {N} bytes, got {}", bytes.len())))
}

fn malformed(reason: &str) -> FormsgError {
    FormsgError::ContentMalformed(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_envelope(public_key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> String {
        format!(
            "{};{}:{}",
            STANDARD.encode(public_key),
            STANDARD.encode(nonce),
            STANDARD.encode(ciphertext)
        )
    }

    #[test]
    fn test_parse_envelope() {
        let raw = encode_envelope(&[1u8; 32], &[2u8; 24], b"ciphertext");
        let envelope = Envelope::parse(&raw).unwrap();

        assert_eq!(envelope.submission_public_key, [1u8; 32]);
        assert_eq!(envelope.nonce, [2u8; 24]);
        assert_eq!(envelope.ciphertext, b"ciphertext");
    }

    #[test]
    fn test_parse_envelope_wrong_structure() {
        for raw in ["", "abc", "a;b", "a:b;c", "a;b:c:d", "a;b;c:d"] {
            assert!(
                matches!(Envelope::parse(raw), Err(FormsgError::ContentMalformed(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_parse_envelope_wrong_lengths() {
        let short_key = encode_envelope(&[1u8; 31], &[2u8; 24], b"c");
        let short_nonce = encode_envelope(&[1u8; 32], &[2u8; 12], b"c");

        assert!(matches!(Envelope::parse(&short_key), Err(FormsgError::ContentMalformed(_))));
        assert!(matches!(Envelope::parse(&short_nonce), Err(FormsgError::ContentMalformed(_))));
    }

    #[test]
    fn test_parse_envelope_bad_base64() {
        let raw = format!("{};!!!!:{}", STANDARD.encode([1u8; 32]), STANDARD.encode(b"c"));
        assert!(matches!(Envelope::parse(&raw), Err(FormsgError::ContentMalformed(_))));
    }

    #[test]
    fn test_decode_secret_key() {
        assert!(decode_secret_key(&STANDARD.encode([7u8; 32])).is_ok());
        assert!(matches!(
            decode_secret_key(&STANDARD.encode([7u8; 16])),
            Err(FormsgError::InvalidSecretKey(_))
        ));
        assert!(matches!(
            decode_secret_key("%%%"),
            Err(FormsgError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn test_open_box_round_trip_and_tamper() {
        let form_secret = SecretKey::from([3u8; 32]);
        let submission_secret = SecretKey::from([4u8; 32]);
        let nonce = [5u8; 24];

        let ciphertext = SalsaBox::new(&form_secret.public_key(), &submission_secret)
            .encrypt(Nonce::from_slice(&nonce), b"hello".as_slice())
            .unwrap();
        let submission_public = submission_secret.public_key().to_bytes();

        let plaintext = open_box(&form_secret, &submission_public, &nonce, &ciphertext).unwrap();
        assert_eq!(plaintext, b"hello");

        let mut tampered = ciphertext.clone();
        tampered[0] ^= 1;
        assert_eq!(
            open_box(&form_secret, &submission_public, &nonce, &tampered),
            Err(FormsgError::DecryptionFailed)
        );
    }

    #[test]
    fn test_attachment_binary_from_encrypted_file() {
        let file = EncryptedFile {
            submission_public_key: STANDARD.encode([1u8; 32]),
            nonce: STANDARD.encode([2u8; 24]),
            binary: STANDARD.encode(b"data"),
        };
        let binary = AttachmentBinary::try_from(&file).unwrap();
        assert_eq!(binary.ciphertext, b"data");

        let bad = EncryptedFile {
            nonce: STANDARD.encode([2u8; 8]),
            ..file
        };
        assert!(AttachmentBinary::try_from(&bad).is_err());
    }
}
