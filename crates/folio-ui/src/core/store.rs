//! App-wide yewdux store.
//!
//! # Design
//! - The store mirrors coordinator output; it never merges resources itself.
//! - Reducers are plain functions over `&mut LibraryStore` so they test without a DOM.

use crate::core::navigation::DisplayMode;
use crate::features::library::logic::filter_for_mode;
use crate::models::{Origin, Resource, ResourceId};
use std::cmp::Reverse;
use yewdux::store::Store;

/// Severity of a banner notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Action succeeded.
    Success,
    /// Action failed.
    Error,
}

/// Short-lived operator notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Display text.
    pub message: String,
}

/// Pending delete awaiting operator confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletePrompt {
    /// Target id.
    pub id: ResourceId,
    /// Target title, shown in the prompt.
    pub title: String,
    /// Target origin.
    pub origin: Origin,
}

/// Global store for the library shell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Store)]
pub struct LibraryStore {
    /// Latest merged view published by the coordinator.
    pub resources: Vec<Resource>,
    /// Section derived from the current route.
    pub mode: DisplayMode,
    /// Whether admin mode is active.
    pub is_admin: bool,
    /// Banner notice, if any.
    pub notice: Option<Notice>,
    /// Delete confirmation, if open.
    pub delete_prompt: Option<DeletePrompt>,
    /// Whether an upload is in flight.
    pub uploading: bool,
}

/// Replace the published view.
pub fn publish_view(store: &mut LibraryStore, resources: &[Resource]) {
    store.resources = resources.to_vec();
    if let Some(prompt) = &store.delete_prompt
        && !store.resources.iter().any(|resource| resource.id == prompt.id)
    {
        store.delete_prompt = None;
    }
}

/// Record the display mode for the current route.
pub const fn set_mode(store: &mut LibraryStore, mode: DisplayMode) {
    store.mode = mode;
}

/// Track admin mode; leaving it closes any open delete prompt.
pub fn set_admin(store: &mut LibraryStore, is_admin: bool) {
    store.is_admin = is_admin;
    if !is_admin {
        store.delete_prompt = None;
    }
}

/// Show a notice, replacing any previous one.
pub fn set_notice(store: &mut LibraryStore, kind: NoticeKind, message: impl Into<String>) {
    store.notice = Some(Notice {
        kind,
        message: message.into(),
    });
}

/// Dismiss the notice.
pub fn clear_notice(store: &mut LibraryStore) {
    store.notice = None;
}

/// Open the delete prompt for a visible resource. No-op outside admin mode.
pub fn open_delete_prompt(store: &mut LibraryStore, id: &ResourceId) -> bool {
    if !store.is_admin {
        return false;
    }
    let Some(resource) = store.resources.iter().find(|resource| &resource.id == id) else {
        return false;
    };
    store.delete_prompt = Some(DeletePrompt {
        id: resource.id.clone(),
        title: resource.title.clone(),
        origin: resource.origin,
    });
    true
}

/// Close the delete prompt, returning it.
pub fn close_delete_prompt(store: &mut LibraryStore) -> Option<DeletePrompt> {
    store.delete_prompt.take()
}

/// Resources shown for the current mode.
#[must_use]
pub fn select_visible(store: &LibraryStore) -> Vec<Resource> {
    filter_for_mode(&store.resources, store.mode)
}

/// Newest uploads first, capped at `limit`.
#[must_use]
pub fn select_recent(store: &LibraryStore, limit: usize) -> Vec<Resource> {
    let mut uploads = filter_for_mode(&store.resources, DisplayMode::Recent);
    uploads.sort_by_key(|resource| Reverse(resource.uploaded_at));
    uploads.truncate(limit);
    uploads
}
