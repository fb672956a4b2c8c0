//! Pure library helpers extracted from views for non-wasm testing.

use crate::core::navigation::DisplayMode;
use crate::models::{Origin, Resource, ResourceId};

/// Turn an uploaded file name into a display title.
///
/// Drops a trailing `.pdf` (either case), maps `_`/`-` to spaces and
/// capitalises each word.
#[must_use]
pub fn format_title(file_name: &str) -> String {
    let stem = file_name
        .strip_suffix(".pdf")
        .or_else(|| file_name.strip_suffix(".PDF"))
        .unwrap_or(file_name);
    stem.replace(['_', '-'], " ")
        .split(' ')
        .map(capitalise)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Select the slice of the merged view shown for a display mode.
#[must_use]
pub fn filter_for_mode(view: &[Resource], mode: DisplayMode) -> Vec<Resource> {
    match mode {
        DisplayMode::Library => view.to_vec(),
        DisplayMode::Recent => view
            .iter()
            .filter(|resource| resource.origin == Origin::Uploaded)
            .cloned()
            .collect(),
        DisplayMode::About => Vec::new(),
    }
}

/// Scheme, host and port of a URL, without any path.
#[must_use]
pub fn backend_origin(api_base_url: &str) -> &str {
    let Some(scheme_end) = api_base_url.find("://") else {
        return api_base_url.trim_end_matches('/');
    };
    let host_start = scheme_end + 3;
    api_base_url[host_start..]
        .find('/')
        .map_or(api_base_url, |offset| &api_base_url[..host_start + offset])
}

/// Resolve a backend-supplied download URL into an absolute one.
#[must_use]
pub fn absolute_url(api_base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if url.starts_with("/assets/") {
        return format!("{}{url}", backend_origin(api_base_url));
    }
    url.to_string()
}

/// Viewer URL for a stored document.
#[must_use]
pub fn view_url(api_base_url: &str, id: &ResourceId) -> String {
    format!(
        "{}/pdfs/{}/view",
        api_base_url.trim_end_matches('/'),
        urlencoding::encode(id.as_str())
    )
}
