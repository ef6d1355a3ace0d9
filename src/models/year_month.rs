use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Calendar month in `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(AppError::InvalidYearMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month of a `YYYY-MM-DD` string. The whole string must be a real
    /// calendar day.
    pub fn of_date_str(date: &str) -> AppResult<Self> {
        if date.len() != 10 {
            return Err(AppError::InvalidDate(date.to_string()));
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(Self::of)
            .map_err(|_| AppError::InvalidDate(date.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// True when `date` (`YYYY-MM-DD`) starts with this month's prefix.
    pub fn contains_str(&self, date: &str) -> bool {
        date.get(..7).is_some_and(|p| p == self.to_string())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidYearMonth(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year = y.parse::<i32>().map_err(|_| invalid())?;
        let month = m.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats() {
        let ym: YearMonth = "2025-01".parse().unwrap();
        assert_eq!(ym.year(), 2025);
        assert_eq!(ym.month(), 1);
        assert_eq!(ym.to_string(), "2025-01");
    }

    #[test]
    fn rejects_bad_input() {
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("2025-1".parse::<YearMonth>().is_err());
        assert!("202501".parse::<YearMonth>().is_err());
    }

    #[test]
    fn month_of_date_string() {
        let ym = YearMonth::of_date_str("2025-02-28").unwrap();
        assert_eq!(ym.to_string(), "2025-02");
        assert!(ym.contains_str("2025-02-01"));
        assert!(!ym.contains_str("2025-03-01"));
        assert!(YearMonth::of_date_str("2025").is_err());
    }

    #[test]
    fn date_string_must_be_a_calendar_day() {
        for bad in ["2025-01-99", "2025-02-30", "2025-1-05", "2025-01-05x", " 2025-01-05"] {
            assert!(YearMonth::of_date_str(bad).is_err(), "{bad}");
        }
        assert!(YearMonth::of_date_str("2024-02-29").is_ok());
    }
}
