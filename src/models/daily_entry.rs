use crate::errors::AppResult;
use crate::models::year_month::YearMonth;
use crate::utils::time::{BreakInput, normalize_break_time};
use serde::{Deserialize, Serialize};

/// Break duration as it arrives from the data source: either integer
/// minutes or an `H:mm` / `HH:mm` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BreakTime {
    Minutes(i64),
    Text(String),
}

impl BreakTime {
    pub fn as_input(&self) -> BreakInput<'_> {
        match self {
            BreakTime::Minutes(m) => BreakInput::Minutes(*m),
            BreakTime::Text(s) => BreakInput::Text(s),
        }
    }
}

impl Default for BreakTime {
    fn default() -> Self {
        BreakTime::Text(String::new())
    }
}

/// One day of attendance as stored by the record backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: String, // YYYY-MM-DD
    #[serde(default)]
    pub start_time: String, // HH:mm or ""
    #[serde(default)]
    pub break_time: Option<BreakTime>,
    #[serde(default)]
    pub end_time: String, // HH:mm or ""
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DailyEntry {
    pub fn new(date: impl Into<String>, start: &str, break_time: Option<BreakTime>, end: &str) -> Self {
        Self {
            date: date.into(),
            start_time: start.to_string(),
            break_time,
            end_time: end.to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn year_month(&self) -> AppResult<YearMonth> {
        YearMonth::of_date_str(&self.date)
    }

    /// Break in minutes after normalization (0 for empty or invalid input).
    pub fn break_minutes(&self) -> i64 {
        let input = self
            .break_time
            .as_ref()
            .map(BreakTime::as_input)
            .unwrap_or(BreakInput::Missing);
        normalize_break_time(input).minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_break_as_minutes_or_text() {
        let a: DailyEntry = serde_json::from_str(
            r#"{"date":"2025-01-02","startTime":"09:00","breakTime":45,"endTime":"17:00"}"#,
        )
        .unwrap();
        assert_eq!(a.break_time, Some(BreakTime::Minutes(45)));
        assert_eq!(a.break_minutes(), 45);

        let b: DailyEntry = serde_json::from_str(
            r#"{"date":"2025-01-03","startTime":"09:00","breakTime":"1:15","endTime":"17:00","location":"office"}"#,
        )
        .unwrap();
        assert_eq!(b.break_minutes(), 75);
        assert_eq!(b.location.as_deref(), Some("office"));
    }

    #[test]
    fn missing_fields_default_to_blank() {
        let e: DailyEntry = serde_json::from_str(r#"{"date":"2025-01-04"}"#).unwrap();
        assert!(e.start_time.is_empty());
        assert!(e.end_time.is_empty());
        assert_eq!(e.break_minutes(), 0);
    }
}
