use crate::errors::{AppError, AppResult};
use crate::worker::network::Response;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

type Caches = BTreeMap<String, HashMap<String, Response>>;

/// Named response caches, `name -> url -> response`.
///
/// Reads never fail: a broken cache simply misses. Writes report errors so
/// callers can decide to ignore them. `set_read_only(true)` makes every
/// write fail, which is how a full quota is simulated.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: Mutex<Caches>,
    read_only: AtomicBool,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn caches(&self) -> MutexGuard<'_, Caches> {
        self.caches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn writable(&self) -> AppResult<MutexGuard<'_, Caches>> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(AppError::Storage("resource cache is read-only".into()));
        }
        Ok(self.caches())
    }

    pub fn open(&self, name: &str) -> AppResult<()> {
        self.writable()?.entry(name.to_string()).or_default();
        Ok(())
    }

    pub fn put(&self, name: &str, url: &str, response: Response) -> AppResult<()> {
        self.writable()?
            .entry(name.to_string())
            .or_default()
            .insert(url.to_string(), response);
        Ok(())
    }

    pub fn match_in(&self, name: &str, url: &str) -> Option<Response> {
        self.caches().get(name).and_then(|c| c.get(url)).cloned()
    }

    /// First hit across all caches, in name order.
    pub fn match_any(&self, url: &str) -> Option<Response> {
        self.caches().values().find_map(|c| c.get(url)).cloned()
    }

    pub fn delete(&self, name: &str) -> bool {
        self.caches().remove(name).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.caches().keys().cloned().collect()
    }

    pub fn urls(&self, name: &str) -> Vec<String> {
        let mut urls: Vec<String> = self
            .caches()
            .get(name)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        urls.sort();
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_any_searches_every_cache() {
        let storage = CacheStorage::new();
        storage.put("a", "/x", Response::ok("ax")).unwrap();
        storage.put("b", "/y", Response::ok("by")).unwrap();

        assert_eq!(storage.match_any("/y").unwrap().text(), "by");
        assert!(storage.match_in("a", "/y").is_none());
        assert_eq!(storage.keys(), vec!["a", "b"]);
    }

    #[test]
    fn read_only_rejects_writes_but_serves_reads() {
        let storage = CacheStorage::new();
        storage.put("v1", "/", Response::ok("home")).unwrap();
        storage.set_read_only(true);

        assert!(storage.put("v1", "/app.js", Response::ok("js")).is_err());
        assert!(storage.match_any("/").is_some());
        assert_eq!(storage.urls("v1"), vec!["/"]);
    }
}
