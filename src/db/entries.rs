//! Local record backend: the `entries` table. One row per date.

use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::{BreakTime, DailyEntry, YearMonth};
use crate::sync::source::{RecordSink, RecordSource, SaveOutcome};
use crate::utils::date::parse_date;
use crate::utils::time::{BreakInput, normalize_break_time, normalize_clock_time};
use async_trait::async_trait;
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub fn map_row(row: &Row) -> rusqlite::Result<DailyEntry> {
    let break_str: String = row.get("break_time")?;
    Ok(DailyEntry {
        date: row.get("date")?,
        start_time: row.get("start_time")?,
        break_time: if break_str.is_empty() {
            None
        } else {
            Some(BreakTime::Text(break_str))
        },
        end_time: row.get("end_time")?,
        location: row.get("location")?,
    })
}

/// Check and canonicalize a record before it is written.
pub fn normalize_entry(entry: &DailyEntry) -> AppResult<DailyEntry> {
    let date = parse_date(&entry.date).ok_or_else(|| AppError::InvalidDate(entry.date.clone()))?;

    let clock = |raw: &str| -> AppResult<String> {
        let n = normalize_clock_time(raw);
        if n.is_empty {
            Ok(String::new())
        } else if n.is_valid {
            Ok(n.time_string)
        } else {
            Err(AppError::InvalidTime(raw.to_string()))
        }
    };

    let brk = entry
        .break_time
        .as_ref()
        .map(BreakTime::as_input)
        .unwrap_or(BreakInput::Missing);
    let brk_norm = normalize_break_time(brk);
    if !brk_norm.is_valid && !brk_norm.is_empty {
        let shown = match &entry.break_time {
            Some(BreakTime::Minutes(m)) => format!("{m} min"),
            Some(BreakTime::Text(s)) => s.clone(),
            None => String::new(),
        };
        return Err(AppError::InvalidTime(format!("break {shown}")));
    }

    Ok(DailyEntry {
        date: date.format("%Y-%m-%d").to_string(),
        start_time: clock(&entry.start_time)?,
        break_time: brk_norm
            .is_valid
            .then(|| BreakTime::Text(brk_norm.time_string)),
        end_time: clock(&entry.end_time)?,
        location: entry
            .location
            .as_ref()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
    })
}

pub fn upsert_entry(conn: &Connection, entry: &DailyEntry) -> AppResult<()> {
    let break_str = match &entry.break_time {
        Some(BreakTime::Text(s)) => s.clone(),
        Some(BreakTime::Minutes(m)) => normalize_break_time(BreakInput::Minutes(*m))
            .is_valid
            .then(|| crate::utils::time::format_minutes(*m))
            .unwrap_or_default(),
        None => String::new(),
    };

    conn.execute(
        "INSERT INTO entries (date, start_time, break_time, end_time, location, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(date) DO UPDATE SET
             start_time = excluded.start_time,
             break_time = excluded.break_time,
             end_time   = excluded.end_time,
             location   = excluded.location,
             updated_at = excluded.updated_at",
        params![
            entry.date,
            entry.start_time,
            break_str,
            entry.end_time,
            entry.location,
            Local::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn load_month(conn: &Connection, ym: YearMonth) -> AppResult<Vec<DailyEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT date, start_time, break_time, end_time, location
         FROM entries
         WHERE substr(date, 1, 7) = ?1
         ORDER BY date ASC",
    )?;

    let rows = stmt.query_map([ym.to_string()], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn load_entry(conn: &Connection, date: &str) -> AppResult<Option<DailyEntry>> {
    let entry = conn
        .query_row(
            "SELECT date, start_time, break_time, end_time, location
             FROM entries WHERE date = ?1",
            [date],
            map_row,
        )
        .optional()?;
    Ok(entry)
}

/// SQLite-backed stand-in for the remote spreadsheet service.
pub struct SqliteRecordStore {
    pool: Mutex<DbPool>,
}

impl SqliteRecordStore {
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
            .map_err(|_| AppError::Storage("entries connection poisoned".into()))
    }

    pub fn month(&self, ym: YearMonth) -> AppResult<Vec<DailyEntry>> {
        load_month(&self.pool()?.conn, ym)
    }

    pub fn entry(&self, date: &str) -> AppResult<Option<DailyEntry>> {
        load_entry(&self.pool()?.conn, date)
    }

    pub fn log(&self, operation: &str, target: &str, message: &str) -> AppResult<()> {
        crate::db::log::ttlog(&self.pool()?.conn, operation, target, message)
    }
}

#[async_trait]
impl RecordSource for SqliteRecordStore {
    async fn fetch_monthly_records(
        &self,
        year: i32,
        month: u32,
        _force_refresh: bool,
    ) -> AppResult<Vec<DailyEntry>> {
        let ym = YearMonth::new(year, month)?;
        let records = self.month(ym)?;
        debug!(month = %ym, count = records.len(), "fetched monthly records");
        Ok(records)
    }
}

#[async_trait]
impl RecordSink for SqliteRecordStore {
    async fn persist_record(&self, entry: &DailyEntry) -> AppResult<SaveOutcome> {
        let normalized = match normalize_entry(entry) {
            Ok(n) => n,
            Err(e) => return Ok(SaveOutcome::failed(e.to_string())),
        };
        upsert_entry(&self.pool()?.conn, &normalized)?;
        debug!(date = %normalized.date, "record persisted");
        Ok(SaveOutcome::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteRecordStore {
        SqliteRecordStore::new(DbPool::in_memory().unwrap())
    }

    #[tokio::test]
    async fn persist_then_fetch_month() {
        let s = store();
        let e = DailyEntry::new("2025-03-04", "9:00", Some(BreakTime::Minutes(30)), "17:30")
            .with_location("office");
        assert!(s.persist_record(&e).await.unwrap().success);
        s.persist_record(&DailyEntry::new("2025-04-01", "08:00", None, ""))
            .await
            .unwrap();

        let march = s.fetch_monthly_records(2025, 3, false).await.unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].start_time, "09:00");
        assert_eq!(march[0].break_time, Some(BreakTime::Text("00:30".into())));
        assert_eq!(march[0].location.as_deref(), Some("office"));
    }

    #[tokio::test]
    async fn second_save_overwrites_the_day() {
        let s = store();
        s.persist_record(&DailyEntry::new("2025-03-04", "09:00", None, ""))
            .await
            .unwrap();
        s.persist_record(&DailyEntry::new("2025-03-04", "", None, ""))
            .await
            .unwrap();

        let e = s.entry("2025-03-04").unwrap().unwrap();
        assert!(e.start_time.is_empty());
        assert_eq!(e.break_time, None);
    }

    #[tokio::test]
    async fn invalid_record_is_reported_not_stored() {
        let s = store();
        let out = s
            .persist_record(&DailyEntry::new("2025-03-04", "25:00", None, ""))
            .await
            .unwrap();
        assert!(!out.success);
        assert!(out.error.unwrap().contains("25:00"));
        assert!(s.entry("2025-03-04").unwrap().is_none());
    }
}
