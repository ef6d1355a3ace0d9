//! Per-month cache answering "does this date have a recorded entry?".
//!
//! One month is resident at a time. Every mutation is persisted through the
//! [`KeyValueStore`]; persistence failures are logged and otherwise ignored,
//! so the in-memory copy stays authoritative for the process lifetime. The
//! cache is a hint: it can always be rebuilt from the record source.

use crate::errors::{AppError, AppResult};
use crate::models::{
    DailyEntry, DateEntryStatus, EntryStatusLookup, MonthlyEntryCache, PersistedMonthlyCache,
    StatusSource, YearMonth,
};
use crate::storage::KeyValueStore;
use crate::utils::clock::Clock;
use crate::utils::date::parse_date;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const STORAGE_KEY_PREFIX: &str = "attendance_entry_cache_";

pub fn storage_key(ym: YearMonth) -> String {
    format!("{STORAGE_KEY_PREFIX}{ym}")
}

/// Canonical entry-presence predicate: a start time or an end time was
/// recorded. Break time alone never counts.
pub fn determine_entry_status(record: &DailyEntry) -> bool {
    !record.start_time.trim().is_empty() || !record.end_time.trim().is_empty()
}

/// Records that may have changed since `threshold`: dated on/after it,
/// dated today, or whose presence disagrees with the cached value.
pub fn detect_changed_records<'a>(
    cache: &MonthlyEntryCache,
    records: &'a [DailyEntry],
    threshold: NaiveDate,
    today: NaiveDate,
) -> Vec<&'a DailyEntry> {
    records
        .iter()
        .filter(|r| {
            let Some(date) = parse_date(&r.date) else {
                warn!(date = %r.date, "skipping record with unparseable date");
                return false;
            };
            if date >= threshold || date == today {
                return true;
            }
            let cached = cache.entries.get(&r.date).map(|e| e.has_entry);
            cached != Some(determine_entry_status(r))
        })
        .collect()
}

/// One record per date, the last occurrence winning. Dates keep the order
/// of their first appearance.
fn last_per_date(records: &[DailyEntry]) -> Vec<DailyEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<DailyEntry> = Vec::new();
    for r in records {
        match index.get(r.date.as_str()) {
            Some(&i) => out[i] = r.clone(),
            None => {
                index.insert(r.date.as_str(), out.len());
                out.push(r.clone());
            }
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub year_month: Option<YearMonth>,
    pub entry_count: usize,
    pub entered_count: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub expired: bool,
}

pub struct EntryStatusCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    expiry: Duration,
    current: Option<MonthlyEntryCache>,
}

impl EntryStatusCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, expiry: Duration) -> Self {
        Self {
            store,
            clock,
            expiry,
            current: None,
        }
    }

    pub fn resident_month(&self) -> Option<YearMonth> {
        self.current.as_ref().map(|c| c.year_month)
    }

    pub fn resident(&self) -> Option<&MonthlyEntryCache> {
        self.current.as_ref()
    }

    fn resident_for(&self, ym: YearMonth) -> Option<&MonthlyEntryCache> {
        self.current.as_ref().filter(|c| c.year_month == ym)
    }

    fn is_expired(&self, cache: &MonthlyEntryCache) -> bool {
        self.clock.now() - cache.last_sync > self.expiry
    }

    /// Build the full map for `ym` from `records`, replacing whatever was
    /// resident. Duplicate dates: last one wins.
    pub fn initialize_month(&mut self, ym: YearMonth, records: &[DailyEntry]) {
        if let Some(old) = self.resident_month().filter(|m| *m != ym) {
            debug!(from = %old, to = %ym, "evicting resident month");
        }

        let now = self.clock.now();
        let mut cache = MonthlyEntryCache::new(ym, now);

        for r in records {
            if !ym.contains_str(&r.date) {
                warn!(month = %ym, date = %r.date, "record outside month ignored");
                continue;
            }
            cache.entries.insert(
                r.date.clone(),
                DateEntryStatus {
                    date: r.date.clone(),
                    has_entry: determine_entry_status(r),
                    last_updated: now,
                },
            );
        }

        info!(
            month = %ym,
            entries = cache.entries.len(),
            entered = cache.entered_count(),
            "entry cache initialized"
        );

        self.current = Some(cache);
        self.save_to_storage();
    }

    /// Recompute and store the status of one date. The month must be
    /// resident or loadable from storage.
    pub fn update_entry_status(&mut self, date: &str, record: &DailyEntry) -> AppResult<()> {
        let ym = YearMonth::of_date_str(date)?;

        if self.resident_for(ym).is_none() {
            self.load_from_storage(ym);
        }

        let now = self.clock.now();
        let cache = self
            .current
            .as_mut()
            .filter(|c| c.year_month == ym)
            .ok_or_else(|| AppError::NoCacheAvailable(ym.to_string()))?;

        let has_entry = determine_entry_status(record);
        cache.entries.insert(
            date.to_string(),
            DateEntryStatus {
                date: date.to_string(),
                has_entry,
                last_updated: now,
            },
        );
        cache.last_sync = now;
        debug!(date, has_entry, "entry status updated");

        self.save_to_storage();
        Ok(())
    }

    /// Cached answer for `date`. A missing or stale cache yields
    /// `StatusSource::Unknown`, which is not the same as "no entry".
    pub fn is_date_entered(&self, date: &str) -> EntryStatusLookup {
        let Ok(ym) = YearMonth::of_date_str(date) else {
            return EntryStatusLookup::unknown();
        };
        let Some(cache) = self.resident_for(ym) else {
            return EntryStatusLookup::unknown();
        };
        if self.is_expired(cache) {
            debug!(month = %ym, "entry cache expired");
            return EntryStatusLookup::unknown();
        }

        match cache.entries.get(date) {
            Some(entry) => EntryStatusLookup {
                has_entry: entry.has_entry,
                source: StatusSource::Cache,
                last_updated: Some(entry.last_updated),
            },
            None => EntryStatusLookup {
                has_entry: false,
                source: StatusSource::Cache,
                last_updated: None,
            },
        }
    }

    /// Apply fresh records for `ym`, touching only dates whose presence
    /// actually changed. Returns how many dates were updated.
    pub fn sync_incremental_changes(
        &mut self,
        ym: YearMonth,
        records: &[DailyEntry],
        last_sync_time: Option<DateTime<Utc>>,
    ) -> AppResult<usize> {
        let Some(cache) = self.resident_for(ym) else {
            self.initialize_month(ym, records);
            return Ok(records.len());
        };

        let threshold = self.clock.date_of(last_sync_time.unwrap_or(cache.last_sync));
        let today = self.clock.today();
        let records = last_per_date(records);

        let updates: Vec<(String, DailyEntry)> =
            detect_changed_records(cache, &records, threshold, today)
                .into_iter()
                .filter(|r| ym.contains_str(&r.date))
                .filter(|r| {
                    let cached = cache
                        .entries
                        .get(&r.date)
                        .map(|e| e.has_entry)
                        .unwrap_or(false);
                    determine_entry_status(r) != cached
                })
                .map(|r| (r.date.clone(), r.clone()))
                .collect();

        let mut updated = 0;
        for (date, record) in &updates {
            self.update_entry_status(date, record)?;
            updated += 1;
        }

        let now = self.clock.now();
        if let Some(c) = self.current.as_mut() {
            c.last_sync = now;
        }
        self.save_to_storage();

        debug!(month = %ym, updated, "incremental sync applied");
        Ok(updated)
    }

    /// Persist the resident month. Failures are logged, never returned.
    pub fn save_to_storage(&self) {
        let Some(cache) = self.current.as_ref() else {
            return;
        };
        let key = storage_key(cache.year_month);
        let result = serde_json::to_string(&PersistedMonthlyCache::from(cache))
            .map_err(AppError::from)
            .and_then(|json| self.store.write_key(&key, &json));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "failed to persist entry cache");
        }
    }

    /// Load the persisted cache for `ym` and make it resident. Returns
    /// whether a cache was loaded; on any failure nothing is resident for
    /// `ym` afterwards.
    pub fn load_from_storage(&mut self, ym: YearMonth) -> bool {
        let key = storage_key(ym);
        let loaded = match self.store.read_key(&key) {
            Ok(Some(json)) => match serde_json::from_str::<PersistedMonthlyCache>(&json) {
                Ok(p) if p.year_month == ym => Some(MonthlyEntryCache::from(p)),
                Ok(p) => {
                    warn!(key = %key, found = %p.year_month, "persisted cache has wrong month");
                    None
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "persisted cache is corrupt");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read entry cache");
                None
            }
        };

        match loaded {
            Some(cache) => {
                debug!(month = %ym, entries = cache.entries.len(), "entry cache loaded");
                self.current = Some(cache);
                true
            }
            None => {
                if self.resident_month() != Some(ym) {
                    self.current = None;
                }
                false
            }
        }
    }

    /// Drop the resident month and its persisted copy.
    pub fn clear(&mut self) {
        if let Some(ym) = self.resident_month() {
            self.clear_month(ym);
        }
    }

    /// Remove the persisted cache of `ym` (and the resident one if it matches).
    pub fn clear_month(&mut self, ym: YearMonth) {
        if self.resident_month() == Some(ym) {
            self.current = None;
        }
        if let Err(e) = self.store.remove_key(&storage_key(ym)) {
            warn!(month = %ym, error = %e, "failed to remove persisted entry cache");
        }
    }

    pub fn stats(&self) -> CacheStats {
        match self.current.as_ref() {
            Some(c) => CacheStats {
                year_month: Some(c.year_month),
                entry_count: c.entries.len(),
                entered_count: c.entered_count(),
                last_sync: Some(c.last_sync),
                expired: self.is_expired(c),
            },
            None => CacheStats {
                year_month: None,
                entry_count: 0,
                entered_count: 0,
                last_sync: None,
                expired: false,
            },
        }
    }
}
