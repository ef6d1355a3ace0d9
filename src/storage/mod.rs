//! Generic persisted key-value storage used by the entry cache.

pub mod memory;
pub mod sqlite;

use crate::errors::AppResult;

pub use memory::MemoryStore;
pub use sqlite::SqliteKvStore;

pub trait KeyValueStore: Send + Sync {
    fn read_key(&self, key: &str) -> AppResult<Option<String>>;
    fn write_key(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove_key(&self, key: &str) -> AppResult<()>;
}
