//! Webhook endpoint handlers.
//!
//! The webhook handler:
//! 1. Authenticates the `X-FormSG-Signature` header against the registered URI
//! 2. Decrypts the submission (and attachments, if enabled)
//! 3. Returns a summary; decrypted content never leaves the process

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::attachments::AttachmentFetcher;
use crate::crypto::DecryptParams;
use crate::error::FormsgError;
use crate::webhook::SIGNATURE_HEADER;
use crate::FormSdk;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sdk: Arc<FormSdk>,
    pub fetcher: Arc<dyn AttachmentFetcher>,
    pub webhook_uri: Arc<str>,
    pub form_secret_key: Arc<str>,
    pub fetch_attachments: bool,
}

impl AppState {
    pub fn new(
        sdk: FormSdk,
        fetcher: Arc<dyn AttachmentFetcher>,
        webhook_uri: &str,
        form_secret_key: &str,
        fetch_attachments: bool,
    ) -> Self {
        Self {
            sdk: Arc::new(sdk),
            fetcher,
            webhook_uri: Arc::from(webhook_uri),
            form_secret_key: Arc::from(form_secret_key),
            fetch_attachments,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// FormSG Webhook
// =============================================================================

/// FormSG webhook body.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    pub data: DecryptParams,
}

/// Webhook response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl WebhookResponse {
    fn rejected(err: &FormsgError) -> (StatusCode, Json<Self>) {
        (
            status_for_error(err),
            Json(WebhookResponse {
                status: "rejected",
                submission_id: None,
                field_count: None,
                attachment_count: None,
                error: Some(err.code()),
            }),
        )
    }
}

/// HTTP status a caller should see for each failure kind.
pub fn status_for_error(err: &FormsgError) -> StatusCode {
    match err {
        FormsgError::HeaderMalformed(_)
        | FormsgError::SignatureInvalid { .. }
        | FormsgError::SignatureExpired { .. } => StatusCode::UNAUTHORIZED,
        FormsgError::ContentMalformed(_)
        | FormsgError::MissingAttachmentUrls
        | FormsgError::AttachmentFieldMismatch { .. } => StatusCode::BAD_REQUEST,
        FormsgError::DecryptionFailed
        | FormsgError::VerificationFailed
        | FormsgError::AttachmentDecryptionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FormsgError::AttachmentFetchFailed { .. } => StatusCode::BAD_GATEWAY,
        FormsgError::MissingSigningKey
        | FormsgError::InvalidSecretKey(_)
        | FormsgError::InvalidPublicKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// FormSG webhook endpoint.
pub async fn formsg_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<WebhookBody>,
) -> impl IntoResponse {
    info!(
        version = body.data.version,
        has_verified_content = body.data.verified_content.is_some(),
        attachment_url_count = body
            .data
            .attachment_download_urls
            .as_ref()
            .map(|urls| urls.len())
            .unwrap_or(0),
        "formsg_webhook_received"
    );

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("formsg_signature_missing");
        return WebhookResponse::rejected(&FormsgError::HeaderMalformed(
            "header is missing".to_string(),
        ));
    };

    let signature = match state.sdk.authenticate(signature, &state.webhook_uri) {
        Ok(signature) => signature,
        Err(e) => {
            warn!(error = %e, "formsg_webhook_unauthenticated");
            return WebhookResponse::rejected(&e);
        }
    };

    let wants_attachments =
        state.fetch_attachments && body.data.attachment_download_urls.is_some();

    let outcome = if wants_attachments {
        state
            .sdk
            .decrypt_attachments(&state.form_secret_key, &body.data, state.fetcher.as_ref())
            .await
            .map(|decrypted| (decrypted.content.responses.len(), decrypted.attachments.len()))
    } else {
        state
            .sdk
            .decrypt(&state.form_secret_key, &body.data)
            .map(|content| (content.responses.len(), 0))
    };

    match outcome {
        Ok((field_count, attachment_count)) => {
            info!(
                submission_id = %signature.submission_id,
                form_id = %signature.form_id,
                field_count = field_count,
                attachment_count = attachment_count,
                "formsg_submission_decrypted"
            );

            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "ok",
                    submission_id: Some(signature.submission_id),
                    field_count: Some(field_count),
                    attachment_count: Some(attachment_count),
                    error: None,
                }),
            )
        }
        Err(e) => {
            if e.is_configuration_error() {
                error!(error = %e, "formsg_receiver_misconfigured");
            } else {
                warn!(
                    submission_id = %signature.submission_id,
                    error_code = e.code(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "formsg_submission_rejected"
                );
            }
            WebhookResponse::rejected(&e)
        }
    }
}
