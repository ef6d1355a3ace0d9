use crate::models::year_month::YearMonth;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cached projection of one date: does it have a recorded entry?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateEntryStatus {
    pub date: String,
    pub has_entry: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

/// The single resident month held by the entry status cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyEntryCache {
    pub year_month: YearMonth,
    pub entries: HashMap<String, DateEntryStatus>,
    pub last_sync: DateTime<Utc>,
}

impl MonthlyEntryCache {
    pub fn new(year_month: YearMonth, last_sync: DateTime<Utc>) -> Self {
        Self {
            year_month,
            entries: HashMap::new(),
            last_sync,
        }
    }

    pub fn entered_count(&self) -> usize {
        self.entries.values().filter(|e| e.has_entry).count()
    }
}

/// Flat, storage-friendly form: the map becomes an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMonthlyCache {
    pub year_month: YearMonth,
    pub entries: Vec<DateEntryStatus>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_sync: DateTime<Utc>,
}

impl From<&MonthlyEntryCache> for PersistedMonthlyCache {
    fn from(cache: &MonthlyEntryCache) -> Self {
        let mut entries: Vec<DateEntryStatus> = cache.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        Self {
            year_month: cache.year_month,
            entries,
            last_sync: cache.last_sync,
        }
    }
}

impl From<PersistedMonthlyCache> for MonthlyEntryCache {
    /// Entries whose date falls outside the month are dropped.
    fn from(p: PersistedMonthlyCache) -> Self {
        let ym = p.year_month;
        let entries = p
            .entries
            .into_iter()
            .filter(|e| ym.contains_str(&e.date))
            .map(|e| (e.date.clone(), e))
            .collect();
        Self {
            year_month: ym,
            entries,
            last_sync: p.last_sync,
        }
    }
}

/// Where an `is_date_entered` answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    /// Answered from a fresh resident cache.
    Cache,
    /// Cache miss or stale cache: the answer is "don't know".
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatusLookup {
    pub has_entry: bool,
    pub source: StatusSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl EntryStatusLookup {
    pub fn unknown() -> Self {
        Self {
            has_entry: false,
            source: StatusSource::Unknown,
            last_updated: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.source == StatusSource::Cache
    }
}
