//! FormSG SDK - webhook authentication and submission decryption.
//!
//! This library consumes FormSG storage-mode webhooks:
//! - `webhook`: verifies the Ed25519 `X-FormSG-Signature` header and its freshness
//! - `crypto`: opens NaCl-boxed submissions and signed verified content
//! - `attachments`: fetches and decrypts attachments, all or nothing
//! - `web`: reference receiver used by the `formsg-web` binary
//!
//! ## Flow
//!
//! ```text
//! header + payload → Webhook::authenticate → Crypto::decrypt → [attachments] → result
//! ```

pub mod attachments;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod sdk;
pub mod web;
pub mod webhook;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use attachments::{AttachmentFetcher, HttpAttachmentFetcher};
pub use config::Config;
pub use crypto::{
    Crypto, DecryptParams, DecryptedAttachment, DecryptedAttachments, DecryptedContent, FormField,
};
pub use error::{FormsgError, Result};
pub use keys::Mode;
pub use sdk::FormSdk;
pub use webhook::{SignatureHeader, Webhook};
