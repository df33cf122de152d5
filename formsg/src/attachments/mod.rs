//! Attachment retrieval for decrypted submissions.
//!
//! Download URLs arrive keyed by field id. Each id must name a filled
//! attachment field of the decrypted content before anything is fetched.
//! Fetches then fan out with a bounded concurrency limit and the result is
//! all-or-nothing: the first failure drops every in-flight fetch.

pub mod fetcher;

use std::collections::BTreeMap;

use crypto_box::SecretKey;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::crypto::{open_attachment, AttachmentBinary, DecryptedAttachment, FormField};
use crate::error::{FormsgError, Result};

pub use fetcher::{AttachmentFetcher, HttpAttachmentFetcher};

/// Map of field id to uploaded filename for every filled attachment field.
pub fn attachment_filenames(responses: &[FormField]) -> BTreeMap<String, String> {
    responses
        .iter()
        .filter_map(|field| {
            field
                .attachment_filename()
                .map(|name| (field.id.clone(), name.to_string()))
        })
        .collect()
}

/// Reject download URLs that do not belong to a filled attachment field.
pub fn check_field_ids(
    download_urls: &BTreeMap<String, String>,
    filenames: &BTreeMap<String, String>,
) -> Result<()> {
    match download_urls.keys().find(|id| !filenames.contains_key(*id)) {
        Some(field_id) => {
            warn!(
                field_id = %field_id,
                url_count = download_urls.len(),
                attachment_field_count = filenames.len(),
                "attachment_field_mismatch"
            );
            Err(FormsgError::AttachmentFieldMismatch {
                field_id: field_id.clone(),
            })
        }
        None => Ok(()),
    }
}

/// Fetch and decrypt every attachment, at most `concurrency` at a time.
///
/// Field ids must already have passed [`check_field_ids`].
pub async fn fetch_and_decrypt(
    secret_key: &SecretKey,
    download_urls: &BTreeMap<String, String>,
    filenames: &BTreeMap<String, String>,
    fetcher: &dyn AttachmentFetcher,
    concurrency: usize,
) -> Result<BTreeMap<String, DecryptedAttachment>> {
    info!(
        attachment_count = download_urls.len(),
        concurrency = concurrency,
        "attachments_fetch_starting"
    );

    let pending: Vec<_> = download_urls
        .iter()
        .map(|(field_id, url)| fetch_entry(secret_key, field_id, url, filenames, fetcher))
        .collect();

    let attachments: BTreeMap<String, DecryptedAttachment> = stream::iter(pending)
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    info!(
        attachment_count = attachments.len(),
        total_bytes = attachments.values().map(|a| a.content.len()).sum::<usize>(),
        "attachments_fetch_complete"
    );

    Ok(attachments)
}

async fn fetch_entry(
    secret_key: &SecretKey,
    field_id: &str,
    url: &str,
    filenames: &BTreeMap<String, String>,
    fetcher: &dyn AttachmentFetcher,
) -> Result<(String, DecryptedAttachment)> {
    let content = fetch_one(secret_key, field_id, url, fetcher).await?;
    let filename = filenames
        .get(field_id)
        .cloned()
        .ok_or_else(|| FormsgError::AttachmentFieldMismatch {
            field_id: field_id.to_string(),
        })?;

    Ok((field_id.to_string(), DecryptedAttachment { filename, content }))
}

async fn fetch_one(
    secret_key: &SecretKey,
    field_id: &str,
    url: &str,
    fetcher: &dyn AttachmentFetcher,
) -> Result<Vec<u8>> {
    let encrypted = fetcher.fetch(url).await.map_err(|e| {
        warn!(field_id = %field_id, error = %e, "attachment_fetch_failed");
        FormsgError::AttachmentFetchFailed {
            field_id: field_id.to_string(),
            reason: format!("{e:#}"),
        }
    })?;

    AttachmentBinary::try_from(&encrypted.encrypted_file)
        .and_then(|binary| open_attachment(secret_key, &binary))
        .map_err(|_| {
            warn!(field_id = %field_id, "attachment_decryption_failed");
            FormsgError::AttachmentDecryptionFailed {
                field_id: field_id.to_string(),
            }
        })
}
