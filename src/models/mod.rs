pub mod daily_entry;
pub mod entry_status;
pub mod sync_result;
pub mod year_month;

pub use daily_entry::{BreakTime, DailyEntry};
pub use entry_status::{
    DateEntryStatus, EntryStatusLookup, MonthlyEntryCache, PersistedMonthlyCache, StatusSource,
};
pub use sync_result::{SyncResult, SyncState, SyncStats};
pub use year_month::YearMonth;
