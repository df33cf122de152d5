//! Encryption and signing helpers that play the FormSG side in tests.

use base64::{engine::general_purpose::STANDARD, Engine};
use crypto_box::{aead::Aead, Nonce, PublicKey, SalsaBox, SecretKey};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde_json::{json, Value};

use crate::crypto::{EncryptedAttachment, EncryptedFile};

const FORM_SECRET_KEY: [u8; 32] = [11u8; 32];
const SUBMISSION_SECRET_KEY: [u8; 32] = [22u8; 32];
const NONCE: [u8; 24] = [33u8; 24];
const SIGNING_SEED: [u8; 32] = [44u8; 32];

pub fn form_secret_key_b64() -> String {
    STANDARD.encode(FORM_SECRET_KEY)
}

pub fn other_secret_key_b64() -> String {
    STANDARD.encode([99u8; 32])
}

fn form_public_key() -> PublicKey {
    SecretKey::from(FORM_SECRET_KEY).public_key()
}

/// Box `plaintext` to the test form key, returning (submission pubkey, nonce, ciphertext).
pub fn seal(plaintext: &[u8]) -> ([u8; 32], [u8; 24], Vec<u8>) {
    let submission_secret = SecretKey::from(SUBMISSION_SECRET_KEY);
    let ciphertext = SalsaBox::new(&form_public_key(), &submission_secret)
        .encrypt(Nonce::from_slice(&NONCE), plaintext)
        .unwrap();
    (submission_secret.public_key().to_bytes(), NONCE, ciphertext)
}

pub fn seal_envelope(plaintext: &[u8]) -> String {
    let (public_key, nonce, ciphertext) = seal(plaintext);
    format!(
        "{};{}:{}",
        STANDARD.encode(public_key),
        STANDARD.encode(nonce),
        STANDARD.encode(ciphertext)
    )
}

pub fn encrypted_attachment(content: &[u8]) -> EncryptedAttachment {
    let (public_key, nonce, ciphertext) = seal(content);
    EncryptedAttachment {
        encrypted_file: EncryptedFile {
            submission_public_key: STANDARD.encode(public_key),
            nonce: STANDARD.encode(nonce),
            binary: STANDARD.encode(ciphertext),
        },
    }
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&SIGNING_SEED)
}

pub fn verifying_key() -> VerifyingKey {
    signing_key().verifying_key()
}

/// NaCl signed message: 64-byte signature followed by the message.
pub fn sign_message(message: &[u8]) -> Vec<u8> {
    let signature = signing_key().sign(message);
    let mut signed = signature.to_bytes().to_vec();
    signed.extend_from_slice(message);
    signed
}

pub fn sample_responses() -> Value {
    json!([
        {"_id": "h1", "question": "Header", "fieldType": "section", "isHeader": true, "answer": ""},
        {"_id": "e1", "question": "Email", "fieldType": "email", "answer": "test@open.gov.sg"},
        {"_id": "c1", "question": "Checkbox", "fieldType": "checkbox", "answerArray": ["Option 2"]},
        {"_id": "att1", "question": "Photo", "fieldType": "attachment", "answer": "cat.png"},
        {"_id": "att2", "question": "Resume", "fieldType": "attachment", "answer": "resume.pdf"},
        {"_id": "att3", "question": "Optional", "fieldType": "attachment", "answer": ""}
    ])
}

pub fn sample_envelope() -> String {
    seal_envelope(sample_responses().to_string().as_bytes())
}
