pub mod manager;
pub mod source;

pub use manager::{BackgroundSyncManager, ListenerId, SharedCache, SyncSettings};
pub use source::{RecordSink, RecordSource, SaveOutcome};
