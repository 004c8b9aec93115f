//! Browser `localStorage` as a blob store.

use ng_core::codec::BlobStore;
use web_sys::Storage;

/// Stores the editor blob in `window.localStorage`.
///
/// Storage can be unavailable (private browsing, sandboxed iframes); reads
/// then find nothing and writes are dropped with a warning.
#[derive(Debug, Default)]
pub struct LocalStore;

fn local_storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

impl BlobStore for LocalStore {
    fn read(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn write(&mut self, key: &str, blob: String) {
        match local_storage() {
            Some(storage) => {
                if let Err(err) = storage.set_item(key, &blob) {
                    log::warn!("failed to write {key}: {err:?}");
                }
            }
            None => log::warn!("localStorage unavailable, {key} not saved"),
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = local_storage()
            && let Err(err) = storage.remove_item(key)
        {
            log::warn!("failed to remove {key}: {err:?}");
        }
    }
}
