use crate::models::year_month::YearMonth;
use chrono::{Datelike, NaiveDate, Weekday};

pub fn all_days_of_month(ym: YearMonth) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let Some(mut d) = ym.first_day() else {
        return out;
    };

    while d.month() == ym.month() {
        out.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }

    out
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn weekday_short(d: NaiveDate) -> &'static str {
    match d.weekday() {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Tu",
        Weekday::Wed => "We",
        Weekday::Thu => "Th",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Su",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_days_cover_whole_month() {
        let feb: YearMonth = "2024-02".parse().unwrap();
        let days = all_days_of_month(feb);
        assert_eq!(days.len(), 29);
        assert_eq!(format_date(days[28]), "2024-02-29");

        let dec: YearMonth = "2025-12".parse().unwrap();
        assert_eq!(all_days_of_month(dec).len(), 31);
    }
}
