use esweb::prefs::{KeyValueStore, StoreError};

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

/// `window.localStorage` as a preference backend.
///
/// Reads degrade to "absent" when storage is disabled; writes report why
/// they failed so the caller can log it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LocalStorage;

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        local_storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = local_storage().ok_or(StoreError::Unavailable)?;
        // set_item only throws on quota errors (or in some private modes).
        storage
            .set_item(key, value)
            .map_err(|_| StoreError::QuotaExceeded)
    }

    fn remove(&mut self, key: &str) {
        if let Some(s) = local_storage() {
            let _ = s.remove_item(key);
        }
    }
}
