pub mod entry_status;

pub use entry_status::{
    CacheStats, EntryStatusCache, STORAGE_KEY_PREFIX, detect_changed_records,
    determine_entry_status, storage_key,
};
