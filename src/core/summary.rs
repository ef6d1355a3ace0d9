//! Monthly summary: one row per calendar day, shared by `month` and
//! `export`.

use crate::cache::{EntryStatusCache, determine_entry_status};
use crate::models::{BreakTime, DailyEntry, YearMonth};
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::date::{all_days_of_month, format_date, weekday_short};
use crate::utils::time::{BreakInput, calculate_working_time, format_minutes, working_minutes};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub date: String,
    pub weekday: String,
    pub entered: bool,
    pub start: String,
    #[serde(rename = "break")]
    pub break_time: String,
    pub end: String,
    pub working_time: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub year_month: YearMonth,
    pub rows: Vec<SummaryRow>,
    pub total_minutes: i64,
    pub entered_days: usize,
}

fn break_input(r: &DailyEntry) -> BreakInput<'_> {
    r.break_time
        .as_ref()
        .map(BreakTime::as_input)
        .unwrap_or(BreakInput::Missing)
}

/// Days without a record fall back to the cache's answer when it has one.
pub fn build_month_summary(
    ym: YearMonth,
    records: &[DailyEntry],
    cache: Option<&EntryStatusCache>,
) -> MonthSummary {
    let by_date: HashMap<&str, &DailyEntry> = records
        .iter()
        .filter(|r| ym.contains_str(&r.date))
        .map(|r| (r.date.as_str(), r))
        .collect();

    let mut rows = Vec::new();
    let mut total_minutes = 0;

    for day in all_days_of_month(ym) {
        let date = format_date(day);
        let row = match by_date.get(date.as_str()) {
            Some(r) => {
                let complete = !r.start_time.is_empty() && !r.end_time.is_empty();
                let working = if complete {
                    total_minutes += working_minutes(&r.start_time, &r.end_time, break_input(r));
                    calculate_working_time(&r.start_time, &r.end_time, break_input(r))
                } else {
                    String::new()
                };
                SummaryRow {
                    date: date.clone(),
                    weekday: weekday_short(day).to_string(),
                    entered: determine_entry_status(r),
                    start: r.start_time.clone(),
                    break_time: match r.break_minutes() {
                        0 => String::new(),
                        m => format_minutes(m),
                    },
                    end: r.end_time.clone(),
                    working_time: working,
                    location: r.location.clone().unwrap_or_default(),
                }
            }
            None => {
                let cached = cache
                    .map(|c| c.is_date_entered(&date))
                    .filter(|l| l.is_known());
                SummaryRow {
                    date: date.clone(),
                    weekday: weekday_short(day).to_string(),
                    entered: cached.is_some_and(|l| l.has_entry),
                    start: String::new(),
                    break_time: String::new(),
                    end: String::new(),
                    working_time: String::new(),
                    location: String::new(),
                }
            }
        };
        rows.push(row);
    }

    let entered_days = rows.iter().filter(|r| r.entered).count();
    MonthSummary {
        year_month: ym,
        rows,
        total_minutes,
        entered_days,
    }
}

fn or_dash(s: &str) -> String {
    if s.is_empty() {
        format!("{GREY}--:--{RESET}")
    } else {
        s.to_string()
    }
}

pub fn print_month_summary(summary: &MonthSummary) {
    println!(
        "{:<10} {:<2}  {:<1}  {:>5}  {:>5}  {:>5}  {:>5}  Location",
        "Date", "", "E", "In", "Break", "Out", "Work"
    );
    println!("{}", "-".repeat(62));

    for r in &summary.rows {
        let mark = if r.entered {
            format!("{GREEN}●{RESET}")
        } else {
            format!("{GREY}·{RESET}")
        };
        println!(
            "{:<10} {:<2}  {}  {:>5}  {:>5}  {:>5}  {:>5}  {}",
            r.date,
            r.weekday,
            mark,
            or_dash(&r.start),
            or_dash(&r.break_time),
            or_dash(&r.end),
            or_dash(&r.working_time),
            r.location
        );
    }

    println!("{}", "-".repeat(62));
    println!(
        "Entered days: {}   Total working time: {}",
        summary.entered_days,
        format_minutes(summary.total_minutes)
    );
}
