//! Document records shared by the reconciliation engine, transport and views.

use crate::features::library::logic::{absolute_url, format_title};
use chrono::{DateTime, Utc};
use folio_api_models::PdfRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix applied to ids minted locally for optimistic placeholders.
pub const LOCAL_ID_PREFIX: &str = "local-";
/// Prefix applied to configured baseline ids.
pub const BASELINE_ID_PREFIX: &str = "baseline-";

const UPLOADED_DESCRIPTION: &str =
    "Uploaded PDF document. Click to view more details about this document.";

/// Stable identifier for one logical document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mint a fresh id for an optimistic placeholder.
    #[must_use]
    pub fn local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id was minted locally and has no backend counterpart yet.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a resource came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Fixed entry with no remote counterpart.
    Baseline,
    /// Entry stored by the document backend.
    Uploaded,
}

/// Catalogue metadata shown on detail pages. Uploaded records carry none.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueDetails {
    /// Author credit.
    pub author: Option<String>,
    /// Page count.
    pub pages: Option<u32>,
    /// Shelf category.
    pub category: Option<String>,
    /// Publication date as printed.
    pub published: Option<String>,
    /// Document language.
    pub language: Option<String>,
    /// Long-form description for the detail page.
    pub summary: Option<String>,
}

impl CatalogueDetails {
    /// Whether any field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.pages.is_none()
            && self.category.is_none()
            && self.published.is_none()
            && self.language.is_none()
            && self.summary.is_none()
    }
}

/// A document record as displayed in the library.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable identifier, unique within the merged view.
    pub id: ResourceId,
    /// Display title.
    pub title: String,
    /// Short description for cards.
    pub description: String,
    /// Payload size when known.
    pub size_bytes: Option<u64>,
    /// Upload timestamp when known.
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Download URL when known.
    pub source_url: Option<String>,
    /// Source of the record.
    pub origin: Origin,
    /// Catalogue metadata, empty for uploads.
    #[serde(default)]
    pub details: CatalogueDetails,
}

impl Resource {
    /// Build a baseline entry.
    #[must_use]
    pub fn baseline(
        id: impl Into<ResourceId>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            size_bytes: None,
            uploaded_at: None,
            source_url: None,
            origin: Origin::Baseline,
            details: CatalogueDetails::default(),
        }
    }

    /// Build an uploaded entry with only the fields every record carries.
    #[must_use]
    pub fn uploaded(id: impl Into<ResourceId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: UPLOADED_DESCRIPTION.to_string(),
            size_bytes: None,
            uploaded_at: None,
            source_url: None,
            origin: Origin::Uploaded,
            details: CatalogueDetails::default(),
        }
    }

    /// Placeholder shown while an upload is in flight.
    #[must_use]
    pub fn placeholder(file_name: &str, size_bytes: u64, now_ms: i64) -> Self {
        Self {
            size_bytes: Some(size_bytes),
            uploaded_at: DateTime::from_timestamp_millis(now_ms),
            ..Self::uploaded(ResourceId::local(), format_title(file_name))
        }
    }

    /// Map a backend record, resolving its download URL against the API base.
    #[must_use]
    pub fn from_record(record: PdfRecord, api_base_url: &str) -> Self {
        Self {
            size_bytes: Some(record.file_size),
            uploaded_at: DateTime::parse_from_rfc3339(&record.upload_date)
                .ok()
                .map(|stamp| stamp.with_timezone(&Utc)),
            source_url: Some(absolute_url(api_base_url, &record.url)),
            ..Self::uploaded(record.id, format_title(&record.original_name))
        }
    }

    /// Human-friendly size rounded to one decimal place.
    #[must_use]
    pub fn size_label(&self) -> Option<String> {
        const BYTES_PER_MIB: u64 = 1024 * 1024;
        let bytes = self.size_bytes?;
        if bytes < BYTES_PER_MIB {
            return Some(format!("{} KB", bytes.div_ceil(1024)));
        }
        let tenths = bytes.saturating_mul(10) / BYTES_PER_MIB;
        Some(format!("{}.{} MB", tenths / 10, tenths % 10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PdfRecord {
        PdfRecord {
            id: "66f1".into(),
            filename: "1700000000000-rust_guide.pdf".into(),
            original_name: "rust_guide.pdf".into(),
            file_size: 4_718_592,
            upload_date: "2024-03-01T10:00:00.000Z".into(),
            url: "/assets/1700000000000-rust_guide.pdf".into(),
        }
    }

    #[test]
    fn record_mapping_formats_title_and_resolves_url() {
        let resource = Resource::from_record(record(), "http://localhost:3000/api");
        assert_eq!(resource.id.as_str(), "66f1");
        assert_eq!(resource.title, "Rust Guide");
        assert_eq!(resource.origin, Origin::Uploaded);
        assert_eq!(
            resource.source_url.as_deref(),
            Some("http://localhost:3000/assets/1700000000000-rust_guide.pdf")
        );
        assert!(resource.uploaded_at.is_some());
        assert_eq!(resource.size_label().as_deref(), Some("4.5 MB"));
    }

    #[test]
    fn record_mapping_drops_unparsable_dates() {
        let mut raw = record();
        raw.upload_date = "yesterday".into();
        assert!(Resource::from_record(raw, "http://h/api").uploaded_at.is_none());
    }

    #[test]
    fn placeholders_use_local_ids() {
        let first = Resource::placeholder("notes.pdf", 10, 1_700_000_000_000);
        let second = Resource::placeholder("notes.pdf", 10, 1_700_000_000_000);
        assert!(first.id.is_local());
        assert_ne!(first.id, second.id);
        assert_eq!(first.title, "Notes");
        assert_eq!(first.size_label().as_deref(), Some("1 KB"));
    }
}
