//! Wires the SQLite-backed collaborators, the entry cache and the sync
//! manager for one CLI invocation.

use crate::cache::EntryStatusCache;
use crate::config::Config;
use crate::db::SqliteRecordStore;
use crate::errors::AppResult;
use crate::storage::SqliteKvStore;
use crate::sync::{BackgroundSyncManager, SharedCache};
use crate::utils::clock::{Clock, SystemClock};
use std::sync::{Arc, Mutex};

pub struct App {
    pub cfg: Config,
    pub records: Arc<SqliteRecordStore>,
    pub kv: Arc<SqliteKvStore>,
    pub clock: Arc<dyn Clock>,
}

impl App {
    pub fn open(cfg: &Config) -> AppResult<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            records: Arc::new(SqliteRecordStore::open(&cfg.database)?),
            kv: Arc::new(SqliteKvStore::open(&cfg.database)?),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn entry_cache(&self) -> EntryStatusCache {
        EntryStatusCache::new(
            self.kv.clone(),
            Arc::clone(&self.clock),
            self.cfg.cache_expiry(),
        )
    }

    pub fn sync_manager(&self, cache: EntryStatusCache) -> BackgroundSyncManager {
        let shared: SharedCache = Arc::new(Mutex::new(cache));
        BackgroundSyncManager::new(
            shared,
            self.records.clone(),
            Arc::clone(&self.clock),
            self.cfg.sync_settings(),
        )
    }
}
