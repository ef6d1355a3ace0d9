use crate::core::app::App;
use crate::errors::{AppError, AppResult};
use crate::models::{BreakTime, DailyEntry, YearMonth};
use crate::sync::RecordSink;
use crate::utils::date::{format_date, parse_date};
use crate::utils::time::parse_optional_time;
use tracing::debug;

/// Fields given on the command line. `None` keeps the stored value, an
/// empty string clears it.
#[derive(Debug, Default, Clone)]
pub struct AddRequest {
    pub date: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub break_time: Option<String>,
    pub location: Option<String>,
}

/// High-level business logic for the `add` command.
pub struct AddLogic;

fn clock_field(given: Option<&String>, stored: &str) -> AppResult<String> {
    match given {
        Some(s) if s.trim().is_empty() => Ok(String::new()),
        Some(_) => Ok(parse_optional_time(given)?.unwrap_or_default()),
        None => Ok(stored.to_string()),
    }
}

impl AddLogic {
    /// Merge the request into the stored record for that day, save it and
    /// refresh the entry cache for the date.
    pub async fn apply(app: &App, req: &AddRequest) -> AppResult<DailyEntry> {
        let date = parse_date(&req.date).ok_or_else(|| AppError::InvalidDate(req.date.clone()))?;
        let date = format_date(date);
        let existing = app
            .records
            .entry(&date)?
            .unwrap_or_else(|| DailyEntry::new(date.clone(), "", None, ""));

        let merged = DailyEntry {
            date: date.clone(),
            start_time: clock_field(req.start.as_ref(), &existing.start_time)?,
            end_time: clock_field(req.end.as_ref(), &existing.end_time)?,
            break_time: match &req.break_time {
                Some(b) if b.trim().is_empty() => None,
                Some(b) => Some(BreakTime::Text(b.trim().to_string())),
                None => existing.break_time.clone(),
            },
            location: match &req.location {
                Some(l) => Some(l.clone()),
                None => existing.location.clone(),
            },
        };

        let outcome = app.records.persist_record(&merged).await?;
        if !outcome.success {
            return Err(AppError::Storage(
                outcome.error.unwrap_or_else(|| "record not saved".into()),
            ));
        }

        let saved = app.records.entry(&date)?.unwrap_or(merged);
        Self::refresh_cache(app, &saved)?;

        let message = format!(
            "in={} break={} out={}",
            saved.start_time,
            saved.break_minutes(),
            saved.end_time
        );
        if let Err(e) = app.records.log("add", &date, &message) {
            debug!(error = %e, "internal log not written");
        }

        Ok(saved)
    }

    fn refresh_cache(app: &App, saved: &DailyEntry) -> AppResult<()> {
        let mut cache = app.entry_cache();
        match cache.update_entry_status(&saved.date, saved) {
            Err(AppError::NoCacheAvailable(_)) => {
                let ym = YearMonth::of_date_str(&saved.date)?;
                let records = app.records.month(ym)?;
                debug!(month = %ym, "no entry cache yet; building it from stored records");
                cache.initialize_month(ym, &records);
                Ok(())
            }
            other => other,
        }
    }
}
