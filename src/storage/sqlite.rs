use super::KeyValueStore;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use chrono::Local;
use rusqlite::{OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};

/// Key-value store over the `kv_store` table.
pub struct SqliteKvStore {
    pool: Mutex<DbPool>,
}

impl SqliteKvStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool: Mutex::new(pool),
        }
    }

    pub fn open(path: &str) -> AppResult<Self> {
        Ok(Self::new(DbPool::open_initialized(path)?))
    }

    fn pool(&self) -> AppResult<MutexGuard<'_, DbPool>> {
        self.pool
            .lock()
            .map_err(|_| AppError::Storage("kv_store connection poisoned".into()))
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let pool = self.pool()?;
        let mut stmt = pool
            .conn
            .prepare_cached("SELECT key FROM kv_store WHERE substr(key, 1, ?1) = ?2 ORDER BY key")?;
        let rows = stmt.query_map(params![prefix.len() as i64, prefix], |row| {
            row.get::<_, String>(0)
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn read_key(&self, key: &str) -> AppResult<Option<String>> {
        let pool = self.pool()?;
        let value = pool
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write_key(&self, key: &str, value: &str) -> AppResult<()> {
        let pool = self.pool()?;
        pool.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove_key(&self, key: &str) -> AppResult<()> {
        let pool = self.pool()?;
        pool.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_remove() {
        let store = SqliteKvStore::new(DbPool::in_memory().unwrap());
        assert_eq!(store.read_key("a").unwrap(), None);

        store.write_key("a", "1").unwrap();
        store.write_key("a", "2").unwrap();
        store.write_key("ab", "3").unwrap();
        assert_eq!(store.read_key("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.keys_with_prefix("a").unwrap(), vec!["a", "ab"]);

        store.remove_key("a").unwrap();
        assert_eq!(store.read_key("a").unwrap(), None);
    }
}
