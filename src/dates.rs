use chrono::{Datelike, Days, NaiveDate, Utc};

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday();
    date - Days::new(u64::from(offset))
}

pub fn week_days(start: NaiveDate) -> Vec<NaiveDate> {
    (0..7).map(|offset| start + Days::new(offset)).collect()
}

pub fn format_key_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_key_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn five_year_span(today: NaiveDate) -> String {
    format!("{}-{}", today.year(), today.year() + 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        parse_key_date(value).expect("valid date")
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start(date("2026-10-17")), date("2026-10-12"));
        assert_eq!(week_start(date("2026-10-12")), date("2026-10-12"));
        assert_eq!(week_start(date("2026-10-18")), date("2026-10-12"));
        assert_eq!(week_start(date("2026-01-01")), date("2025-12-29"));
    }

    #[test]
    fn week_days_span_seven_days() {
        let days = week_days(date("2026-10-12"));
        assert_eq!(days.len(), 7);
        assert_eq!(days[6], date("2026-10-18"));
    }

    #[test]
    fn key_dates_round_trip() {
        assert_eq!(format_key_date(date("2026-03-09")), "2026-03-09");
        assert_eq!(parse_key_date("not-a-date"), None);
    }
}
