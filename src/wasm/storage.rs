//! LocalStorageStore - session keys in `window.localStorage`

use web_sys::Storage;

use crate::store::{SessionStore, StoreError, StoreResult};

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// `None` when storage is disabled (private mode, sandboxed iframe).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

fn js_err(e: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Unavailable(format!("{:?}", e))
}

impl SessionStore for LocalStorageStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.storage.set_item(key, value).map_err(js_err)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.storage.get_item(key).map_err(js_err)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.storage.remove_item(key).map_err(js_err)
    }
}
