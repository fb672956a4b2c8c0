//! Tab-scoped persistence through `sessionStorage`.
//!
//! Values are stored as raw strings so other readers of the tab see the same
//! text the client wrote.

use crate::core::storage::{KeyValueStore, StorageError};
use gloo::console;
use gloo::utils::window;
use web_sys::Storage;

/// [`KeyValueStore`] over the browser's session storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionStorageStore;

impl SessionStorageStore {
    fn storage() -> Result<Storage, String> {
        match window().session_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err("session storage unavailable".to_string()),
            Err(err) => Err(format!("{err:?}")),
        }
    }
}

impl KeyValueStore for SessionStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()
            .and_then(|storage| storage.set_item(key, value).map_err(|err| format!("{err:?}")))
            .map_err(|detail| {
                console::error!("storage operation failed", "set", key, detail.as_str());
                StorageError::Write {
                    key: key.to_string(),
                    detail,
                }
            })
    }

    fn remove(&self, key: &str) {
        if let Err(detail) =
            Self::storage().and_then(|storage| storage.remove_item(key).map_err(|err| format!("{err:?}")))
        {
            console::error!("storage operation failed", "remove", key, detail.as_str());
        }
    }
}
