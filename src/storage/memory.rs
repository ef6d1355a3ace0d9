use super::KeyValueStore;
use crate::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-process store. `set_failing(true)` makes every call error, which is
/// how storage outages are simulated.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn guard(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Storage("memory store unavailable".into()));
        }
        self.values
            .lock()
            .map_err(|_| AppError::Storage("memory store poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn read_key(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn write_key(&self, key: &str, value: &str) -> AppResult<()> {
        self.guard()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_key(&self, key: &str) -> AppResult<()> {
        self.guard()?.remove(key);
        Ok(())
    }
}
