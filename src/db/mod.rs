pub mod entries;
pub mod log;
pub mod migrate;
pub mod pool;

pub use entries::SqliteRecordStore;
pub use pool::DbPool;
