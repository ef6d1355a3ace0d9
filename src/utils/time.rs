//! Time utilities: normalizing break durations and clock times into one
//! canonical `HH:MM` form, overnight-aware differences, working time.

use crate::errors::{AppError, AppResult};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

const MINUTES_PER_DAY: i64 = 24 * 60;

static HHMM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("static regex"));

/// Any of the shapes a time value may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakInput<'a> {
    Minutes(i64),
    Text(&'a str),
    Missing,
}

impl<'a> From<Option<&'a str>> for BreakInput<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map(BreakInput::Text).unwrap_or(BreakInput::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTime {
    pub time_string: String,
    pub minutes: i64,
    pub is_valid: bool,
    pub is_empty: bool,
}

impl NormalizedTime {
    fn empty() -> Self {
        Self {
            time_string: "00:00".to_string(),
            minutes: 0,
            is_valid: false,
            is_empty: true,
        }
    }

    fn invalid() -> Self {
        Self {
            time_string: "00:00".to_string(),
            minutes: 0,
            is_valid: false,
            is_empty: false,
        }
    }
}

/// Parse `H:MM` / `HH:MM` into minutes since midnight, rejecting values that
/// are not a real clock time.
fn parse_hhmm_minutes(s: &str) -> Option<i64> {
    let caps = HHMM.captures(s)?;
    let h: i64 = caps[1].parse().ok()?;
    let m: i64 = caps[2].parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

fn from_minutes(minutes: i64) -> NormalizedTime {
    // zero and "no break" are the same thing
    if minutes == 0 {
        return NormalizedTime::empty();
    }
    if !(0..MINUTES_PER_DAY).contains(&minutes) {
        return NormalizedTime::invalid();
    }
    NormalizedTime {
        time_string: format_minutes(minutes),
        minutes,
        is_valid: true,
        is_empty: false,
    }
}

/// Normalize a break duration given as minutes, as `H:MM`/`HH:MM`, or absent.
pub fn normalize_break_time(input: BreakInput<'_>) -> NormalizedTime {
    match input {
        BreakInput::Missing => NormalizedTime::empty(),
        BreakInput::Minutes(m) => from_minutes(m),
        BreakInput::Text(raw) => {
            let s = raw.trim();
            if s.is_empty() {
                return NormalizedTime::empty();
            }
            if let Some(m) = parse_hhmm_minutes(s) {
                return from_minutes(m);
            }
            if s.chars().all(|c| c.is_ascii_digit()) {
                return match s.parse::<i64>() {
                    Ok(m) => from_minutes(m),
                    Err(_) => NormalizedTime::invalid(),
                };
            }
            NormalizedTime::invalid()
        }
    }
}

/// Normalize a clock time (start/end). Unlike breaks, `00:00` is midnight.
pub fn normalize_clock_time(raw: &str) -> NormalizedTime {
    let s = raw.trim();
    if s.is_empty() {
        return NormalizedTime::empty();
    }
    match parse_hhmm_minutes(s) {
        Some(m) => NormalizedTime {
            time_string: format_minutes(m),
            minutes: m,
            is_valid: true,
            is_empty: false,
        },
        None => NormalizedTime::invalid(),
    }
}

/// Minutes since midnight of an `H:MM`/`HH:MM` clock time.
pub fn parse_time(t: &str) -> Option<i64> {
    parse_hhmm_minutes(t.trim())
}

/// Minutes from `start` to `end`, wrapping across midnight.
pub fn time_diff_minutes(start: &str, end: &str) -> Option<i64> {
    let s = parse_time(start)?;
    let e = parse_time(end)?;
    if e < s {
        Some(e + MINUTES_PER_DAY - s)
    } else {
        Some(e - s)
    }
}

/// Working minutes: (end - start) - break, never negative.
pub fn working_minutes(start: &str, end: &str, break_time: BreakInput<'_>) -> i64 {
    let Some(span) = time_diff_minutes(start, end) else {
        return 0;
    };
    let brk = normalize_break_time(break_time).minutes;
    (span - brk).max(0)
}

/// Working time as `HH:MM`.
pub fn calculate_working_time(start: &str, end: &str, break_time: BreakInput<'_>) -> String {
    format_minutes(working_minutes(start, end, break_time))
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}

/// Validate an optional clock time from the command line, returning its
/// canonical `HH:MM` form.
pub fn parse_optional_time(input: Option<&String>) -> AppResult<Option<String>> {
    match input {
        Some(s) => {
            let n = normalize_clock_time(s);
            if n.is_valid {
                Ok(Some(n.time_string))
            } else {
                Err(AppError::InvalidTime(s.to_string()))
            }
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_from_minutes() {
        assert_eq!(
            normalize_break_time(BreakInput::Minutes(90)),
            NormalizedTime {
                time_string: "01:30".into(),
                minutes: 90,
                is_valid: true,
                is_empty: false
            }
        );
    }

    #[test]
    fn zero_and_missing_break_are_the_same() {
        let zero_text = normalize_break_time(BreakInput::Text("0:00"));
        let expected = NormalizedTime {
            time_string: "00:00".into(),
            minutes: 0,
            is_valid: false,
            is_empty: true,
        };
        assert_eq!(zero_text, expected);
        assert_eq!(normalize_break_time(BreakInput::Missing), expected);
        assert_eq!(normalize_break_time(BreakInput::Minutes(0)), expected);
        assert_eq!(normalize_break_time(BreakInput::Text("  ")), expected);
    }

    #[test]
    fn out_of_range_break_is_invalid() {
        for input in [
            BreakInput::Minutes(-5),
            BreakInput::Minutes(1440),
            BreakInput::Text("24:00"),
            BreakInput::Text("1:75"),
            BreakInput::Text("abc"),
        ] {
            let n = normalize_break_time(input);
            assert_eq!(n.time_string, "00:00", "{input:?}");
            assert!(!n.is_valid, "{input:?}");
            assert!(!n.is_empty, "{input:?}");
        }
    }

    #[test]
    fn short_hour_text_is_padded() {
        let n = normalize_break_time(BreakInput::Text("1:05"));
        assert_eq!(n.time_string, "01:05");
        assert_eq!(n.minutes, 65);
        assert!(n.is_valid);
        assert_eq!(normalize_break_time(BreakInput::Text("45")).minutes, 45);
    }

    #[test]
    fn clock_time_keeps_midnight() {
        let n = normalize_clock_time("0:00");
        assert!(n.is_valid);
        assert_eq!(n.time_string, "00:00");
        assert_eq!(normalize_clock_time("9:05").time_string, "09:05");
        assert!(normalize_clock_time("").is_empty);
    }

    #[test]
    fn overnight_working_time() {
        assert_eq!(
            calculate_working_time("22:00", "06:00", BreakInput::Text("01:00")),
            "07:00"
        );
        assert_eq!(time_diff_minutes("22:00", "06:00"), Some(480));
    }

    #[test]
    fn working_time_never_negative() {
        assert_eq!(
            calculate_working_time("09:00", "09:30", BreakInput::Minutes(60)),
            "00:00"
        );
        assert_eq!(
            calculate_working_time("", "17:00", BreakInput::Missing),
            "00:00"
        );
        assert_eq!(
            calculate_working_time("09:00", "17:30", BreakInput::Minutes(30)),
            "08:00"
        );
    }
}
