//! Builders for resources, upload files and sessions.

use folio_ui::core::auth::Session;
use folio_ui::core::transport::UploadFile;
use folio_ui::models::Resource;

/// MIME type accepted by default.
pub const PDF_MIME: &str = "application/pdf";

/// Backend-stored resource with a fixed id and title.
#[must_use]
pub fn uploaded(id: &str, title: &str) -> Resource {
    Resource::uploaded(id, title)
}

/// Baseline resource; the id is used verbatim.
#[must_use]
pub fn baseline(id: &str, title: &str) -> Resource {
    Resource::baseline(id, title, format!("{title} (built in)"))
}

/// PDF upload of `size_bytes` with a small dummy payload.
#[must_use]
pub fn pdf_file(name: &str, size_bytes: u64) -> UploadFile<Vec<u8>> {
    file_of_type(name, PDF_MIME, size_bytes)
}

/// Upload with an arbitrary MIME type.
#[must_use]
pub fn file_of_type(name: &str, mime_type: &str, size_bytes: u64) -> UploadFile<Vec<u8>> {
    UploadFile {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        size_bytes,
        body: b"%PDF-1.4".to_vec(),
    }
}

/// Session valid until `expires_at_ms`.
#[must_use]
pub fn session_until(token: &str, expires_at_ms: i64) -> Session {
    Session {
        token: token.to_string(),
        expires_at_ms,
    }
}

/// Ids of a view, in order.
#[must_use]
pub fn ids(view: &[Resource]) -> Vec<String> {
    view.iter().map(|resource| resource.id.to_string()).collect()
}
