use crate::cache::{CacheStats, STORAGE_KEY_PREFIX};
use crate::core::app::App;
use crate::errors::{AppError, AppResult};
use crate::models::{EntryStatusLookup, StatusSource, YearMonth};
use crate::storage::KeyValueStore;
use crate::ui::messages::{header, info, success, warning};
use crate::utils::date::{format_date, parse_date};
use tracing::debug;

pub struct StatusLogic;

impl StatusLogic {
    /// Cached answer for one date, from the persisted cache of its month.
    pub fn lookup(app: &App, date: &str) -> AppResult<(String, EntryStatusLookup)> {
        let date = parse_date(date)
            .map(format_date)
            .ok_or_else(|| AppError::InvalidDate(date.to_string()))?;
        let ym = YearMonth::of_date_str(&date)?;

        let mut cache = app.entry_cache();
        cache.load_from_storage(ym);
        Ok((date.clone(), cache.is_date_entered(&date)))
    }

    pub fn print(date: &str, lookup: &EntryStatusLookup) {
        match (lookup.source, lookup.has_entry) {
            (StatusSource::Cache, true) => success(format!("{date}: entered")),
            (StatusSource::Cache, false) => info(format!("{date}: not entered")),
            (StatusSource::Unknown, _) => warning(format!(
                "{date}: unknown (no fresh cache for this month; run `sync`)"
            )),
        }
        if let Some(at) = lookup.last_updated {
            println!("   last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
}

pub struct CacheLogic;

impl CacheLogic {
    pub fn info(app: &App, ym: YearMonth) -> AppResult<CacheStats> {
        let mut cache = app.entry_cache();
        cache.load_from_storage(ym);
        let stats = cache.stats();

        header(format!("ENTRY CACHE {ym}"));
        match stats.last_sync {
            Some(at) => {
                println!("Dates cached : {}", stats.entry_count);
                println!("Entered      : {}", stats.entered_count);
                println!("Last sync    : {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("Expired      : {}", if stats.expired { "yes" } else { "no" });
            }
            None => warning(format!("No cache stored for {ym}")),
        }

        let keys = app.kv.keys_with_prefix(STORAGE_KEY_PREFIX)?;
        let months: Vec<&str> = keys
            .iter()
            .filter_map(|k| k.strip_prefix(STORAGE_KEY_PREFIX))
            .collect();
        println!(
            "Stored months: {}",
            if months.is_empty() {
                "-".to_string()
            } else {
                months.join(", ")
            }
        );
        Ok(stats)
    }

    /// Remove the persisted cache of `ym`, or of every month when `None`.
    /// Returns how many months were cleared.
    pub fn clear(app: &App, ym: Option<YearMonth>) -> AppResult<usize> {
        let mut cache = app.entry_cache();

        let cleared = match ym {
            Some(ym) => {
                let existed = app.kv.read_key(&crate::cache::storage_key(ym))?.is_some();
                cache.clear_month(ym);
                usize::from(existed)
            }
            None => {
                let keys = app.kv.keys_with_prefix(STORAGE_KEY_PREFIX)?;
                let mut n = 0;
                for key in &keys {
                    match key.strip_prefix(STORAGE_KEY_PREFIX).map(str::parse::<YearMonth>) {
                        Some(Ok(ym)) => cache.clear_month(ym),
                        _ => app.kv.remove_key(key)?,
                    }
                    n += 1;
                }
                n
            }
        };

        let target = ym.map(|m| m.to_string()).unwrap_or_else(|| "all".into());
        if let Err(e) = app
            .records
            .log("cache_clear", &target, &format!("{cleared} month(s) cleared"))
        {
            debug!(error = %e, "internal log not written");
        }
        success(format!("Entry cache cleared ({target}): {cleared} month(s)"));
        Ok(cleared)
    }
}
