pub mod add;
pub mod cache;
pub mod config;
pub mod daemon;
pub mod export;
pub mod init;
pub mod log;
pub mod month;
pub mod status;
pub mod sync;

use crate::errors::AppResult;
use crate::models::YearMonth;
use crate::utils::clock::Clock;

/// `--month` value, or the clock's current month.
pub(crate) fn resolve_month(month: Option<&String>, clock: &dyn Clock) -> AppResult<YearMonth> {
    match month {
        Some(m) => m.trim().parse(),
        None => Ok(YearMonth::of(clock.today())),
    }
}
