#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Folio document backend.
//!
//! The document service speaks camelCase JSON. These types mirror its wire
//! contract exactly so the UI transport can decode responses without any
//! ad-hoc field juggling; mapping into domain records happens in `folio-ui`.
use serde::{Deserialize, Serialize};

/// Stored PDF document as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PdfRecord {
    /// Backend-assigned identifier.
    pub id: String,
    /// File name on the backend's disk.
    pub filename: String,
    /// File name supplied by the uploader.
    pub original_name: String,
    /// Payload size in bytes.
    pub file_size: u64,
    /// RFC 3339 upload timestamp.
    pub upload_date: String,
    /// Relative or absolute download URL.
    pub url: String,
}

/// Response body for `GET /pdfs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PdfListResponse {
    /// Every stored document, in backend order.
    #[serde(default)]
    pub pdfs: Vec<PdfRecord>,
}

/// Response body for `POST /upload-pdf`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfUploadResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// The stored record, including backend-assigned metadata.
    pub data: PdfRecord,
}

/// Response body for `DELETE /pdfs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfDeleteResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// Identifier that was removed.
    pub id: String,
}

impl PdfDeleteResponse {
    /// Whether the backend acknowledged removing `id`.
    #[must_use]
    pub fn confirms(&self, id: &str) -> bool {
        self.id == id
    }
}

/// Request body for the admin session exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminSessionRequest {
    /// Opaque credential presented by the operator.
    pub credential: String,
}

/// Response body for a granted admin session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionResponse {
    /// Bearer token to attach to mutating requests.
    pub token: String,
    /// Absolute expiry as Unix epoch milliseconds.
    pub expires_at_epoch_millis: i64,
}

/// Error payload returned by the backend on non-2xx responses.
///
/// The service is inconsistent about the key it uses, so both spellings are
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Preferred message key.
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Legacy message key.
    pub error: Option<String>,
}

impl ErrorBody {
    /// First non-blank message carried by the payload.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message
            .into_iter()
            .chain(self.error)
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}
