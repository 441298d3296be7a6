//! localStorage-backed tamper flag

use crate::describe;
use vigil_core::{sim::MemoryFlagStore, Error, FlagStore, Result};
use web_sys::{Storage, Window};

/// Flag store over `window.localStorage`
///
/// Falls back to an in-memory map when storage is unavailable (private
/// browsing, sandboxed frames). The flag then only lives for the page.
pub enum LocalStorageFlagStore {
    Local(Storage),
    Memory(MemoryFlagStore),
}

impl LocalStorageFlagStore {
    pub fn new(window: &Window) -> Self {
        match window.local_storage() {
            Ok(Some(storage)) => Self::Local(storage),
            Ok(None) => {
                web_sys::console::warn_1(&"[Vigil] localStorage unavailable, flag kept in memory".into());
                Self::Memory(MemoryFlagStore::new())
            }
            Err(e) => {
                web_sys::console::warn_1(&format!("[Vigil] localStorage denied: {}", describe(&e)).into());
                Self::Memory(MemoryFlagStore::new())
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl FlagStore for LocalStorageFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Local(storage) => storage.get_item(key).map_err(|e| Error::storage(describe(&e))),
            Self::Memory(memory) => memory.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Local(storage) => storage.set_item(key, value).map_err(|e| Error::storage(describe(&e))),
            Self::Memory(memory) => memory.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self {
            Self::Local(storage) => storage.remove_item(key).map_err(|e| Error::storage(describe(&e))),
            Self::Memory(memory) => memory.remove(key),
        }
    }
}
