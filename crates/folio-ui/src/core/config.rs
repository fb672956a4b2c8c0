//! Client configuration.
//!
//! # Design
//! - Every field has a default so an empty document is a valid config.
//! - Unknown keys are rejected to catch typos early.
//! - Validation runs once at boot; callers never see a half-valid config.

use crate::models::{BASELINE_ID_PREFIX, CatalogueDetails, Resource, ResourceId};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Id of the inline `<script type="application/json">` carrying the client config.
pub const CONFIG_ELEMENT_ID: &str = "folio-config";
/// Default backend API base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
/// Default accepted upload MIME type.
pub const DEFAULT_UPLOAD_MIME_TYPE: &str = "application/pdf";
/// Default maximum upload size (10 MiB).
pub const DEFAULT_UPLOAD_LIMIT_BYTES: u64 = 10_485_760;
/// Default delay before the post-upload settle refresh.
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 1_500;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document was not valid JSON for this schema.
    #[error("failed to parse configuration")]
    Parse {
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A field held an unusable value.
    #[error("invalid configuration field {field}: {reason}")]
    InvalidField {
        /// Offending field.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
    },
}

/// Static catalogue entry shown alongside uploaded documents.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BaselineEntry {
    /// Identifier, namespaced with a `baseline-` prefix when loaded.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Card description.
    #[serde(default)]
    pub description: String,
    /// Author credit.
    #[serde(default)]
    pub author: Option<String>,
    /// Page count.
    #[serde(default)]
    pub pages: Option<u32>,
    /// Shelf category.
    #[serde(default)]
    pub category: Option<String>,
    /// Publication date as printed.
    #[serde(default)]
    pub published: Option<String>,
    /// Document language.
    #[serde(default)]
    pub language: Option<String>,
    /// Long-form description for the detail page.
    #[serde(default)]
    pub summary: Option<String>,
}

impl BaselineEntry {
    /// Convert into a baseline resource with a namespaced id.
    #[must_use]
    pub fn to_resource(&self) -> Resource {
        let id = if self.id.starts_with(BASELINE_ID_PREFIX) {
            ResourceId::new(self.id.clone())
        } else {
            ResourceId::new(format!("{BASELINE_ID_PREFIX}{}", self.id))
        };
        Resource {
            details: CatalogueDetails {
                author: self.author.clone(),
                pages: self.pages,
                category: self.category.clone(),
                published: self.published.clone(),
                language: self.language.clone(),
                summary: self.summary.clone(),
            },
            ..Resource::baseline(id, self.title.clone(), self.description.clone())
        }
    }
}

/// Runtime configuration for the library client.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Backend API base URL.
    pub api_base_url: String,
    /// Credential presented when entering admin mode.
    pub admin_credential: Option<String>,
    /// Accepted upload MIME type.
    pub upload_mime_type: String,
    /// Maximum upload size in bytes.
    pub upload_limit_bytes: u64,
    /// Delay before the post-upload settle refresh.
    pub settle_delay_ms: u32,
    /// Static catalogue merged under backend documents.
    pub baseline: Vec<BaselineEntry>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            admin_credential: None,
            upload_mime_type: DEFAULT_UPLOAD_MIME_TYPE.to_string(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            baseline: Vec::new(),
        }
    }
}

impl FolioConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidField`] when validation fails.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidField`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://") || base.starts_with('/'))
        {
            return Err(invalid("api_base_url", "must be absolute or root-relative"));
        }
        if self
            .admin_credential
            .as_deref()
            .is_some_and(|value| value.trim().is_empty())
        {
            return Err(invalid("admin_credential", "must not be blank when set"));
        }
        if self.upload_mime_type.trim().is_empty() {
            return Err(invalid("upload_mime_type", "must not be empty"));
        }
        if self.upload_limit_bytes == 0 {
            return Err(invalid("upload_limit_bytes", "must be positive"));
        }
        let mut seen = HashSet::new();
        for entry in &self.baseline {
            if entry.id.trim().is_empty() {
                return Err(invalid("baseline", "ids must not be empty"));
            }
            if !seen.insert(entry.to_resource().id) {
                return Err(invalid("baseline", "ids must be unique"));
            }
            if entry.pages == Some(0) {
                return Err(invalid("baseline", "page counts must be positive"));
            }
        }
        Ok(())
    }

    /// Baseline entries as resources, in configured order.
    #[must_use]
    pub fn baseline_resources(&self) -> Vec<Resource> {
        self.baseline.iter().map(BaselineEntry::to_resource).collect()
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}

const fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = FolioConfig::from_json("{}").unwrap();
        assert_eq!(config, FolioConfig::default());
        assert_eq!(config.upload_limit_bytes, 10_485_760);
        assert_eq!(config.api_base(), "http://localhost:3000/api");
    }

    #[test]
    fn baseline_ids_are_namespaced() {
        let config = FolioConfig::from_json(
            r#"{"baseline":[{"id":"1","title":"Guide"},{"id":"baseline-2","title":"Book"}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = config
            .baseline_resources()
            .into_iter()
            .map(|resource| resource.id.to_string())
            .collect();
        assert_eq!(ids, vec!["baseline-1", "baseline-2"]);
    }

    #[test]
    fn baseline_details_reach_the_resource() {
        let config = FolioConfig::from_json(
            r#"{"baseline":[{"id":"1","title":"Angular Guide","author":"John Developer","pages":150,"category":"Web Development","published":"January 2024","language":"English","summary":"Long form."}]}"#,
        )
        .unwrap();
        let resource = &config.baseline_resources()[0];
        assert_eq!(resource.details.author.as_deref(), Some("John Developer"));
        assert_eq!(resource.details.pages, Some(150));
        assert_eq!(resource.details.category.as_deref(), Some("Web Development"));
        assert_eq!(resource.details.summary.as_deref(), Some("Long form."));
        assert!(!resource.details.is_empty());

        let bare = FolioConfig::from_json(r#"{"baseline":[{"id":"2","title":"Bare"}]}"#).unwrap();
        assert!(bare.baseline_resources()[0].details.is_empty());

        let zero = FolioConfig::from_json(r#"{"baseline":[{"id":"3","title":"Z","pages":0}]}"#)
            .unwrap_err();
        assert!(matches!(
            zero,
            ConfigError::InvalidField {
                field: "baseline",
                ..
            }
        ));
    }

    #[test]
    fn duplicate_baseline_ids_are_rejected() {
        let err = FolioConfig::from_json(
            r#"{"baseline":[{"id":"1","title":"A"},{"id":"baseline-1","title":"B"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "baseline",
                ..
            }
        ));
    }

    #[test]
    fn invalid_fields_are_reported() {
        let zero = FolioConfig::from_json(r#"{"upload_limit_bytes":0}"#).unwrap_err();
        assert!(matches!(
            zero,
            ConfigError::InvalidField {
                field: "upload_limit_bytes",
                ..
            }
        ));
        let blank = FolioConfig::from_json(r#"{"admin_credential":" "}"#).unwrap_err();
        assert!(matches!(
            blank,
            ConfigError::InvalidField {
                field: "admin_credential",
                ..
            }
        ));
        let base = FolioConfig::from_json(r#"{"api_base_url":"ftp://x"}"#).unwrap_err();
        assert!(matches!(
            base,
            ConfigError::InvalidField {
                field: "api_base_url",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = FolioConfig::from_json(r#"{"privileged":"/x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
