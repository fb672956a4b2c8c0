//! Environment helpers for the app shell.

use crate::core::config::{CONFIG_ELEMENT_ID, FolioConfig};
use gloo::console;
use gloo::utils::document;

/// Load the client config embedded in the host page, falling back to defaults.
pub(crate) fn load_config() -> FolioConfig {
    let Some(raw) = document()
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content())
    else {
        return FolioConfig::default();
    };
    if raw.trim().is_empty() {
        return FolioConfig::default();
    }
    match FolioConfig::from_json(&raw) {
        Ok(config) => config,
        Err(err) => {
            let detail = err.to_string();
            console::error!("invalid client configuration", detail.as_str());
            FolioConfig::default()
        }
    }
}

/// Payload size reported by the browser as whole bytes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn file_size_bytes(size: f64) -> u64 {
    if size.is_finite() && size > 0.0 {
        size as u64
    } else {
        0
    }
}
