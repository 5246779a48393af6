use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::Regex;

use crate::error::SinceError;

/// Date format printed under every highlight in the export ("June 1, 2020").
pub const HIGHLIGHT_DATE_FORMAT: &str = "%B %d, %Y";

static AGO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+|an?)\s+(day|week|month|year)s?\s+ago$").unwrap()
});
static LAST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^last\s+(week|month|year)$").unwrap());

pub fn parse_highlight_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), HIGHLIGHT_DATE_FORMAT)
}

/// Roam daily-note title: "June 1st, 2020".
pub fn roam_date(date: NaiveDate) -> String {
    format!(
        "{} {}{}, {}",
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.year()
    )
}

/// Wiki-link to an ISO daily note: "[[2020-06-01]]".
pub fn markdown_date(date: NaiveDate) -> String {
    format!("[[{}]]", date.format("%Y-%m-%d"))
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Resolve a `--since` value relative to `today`.
pub fn parse_since(input: &str, today: NaiveDate) -> Result<NaiveDate, SinceError> {
    let normalized = input.trim().to_lowercase();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    match normalized.as_str() {
        "today" | "now" => return Ok(today),
        "yesterday" => return shift_back(today, "day", 1, input),
        _ => {}
    }

    if let Some(caps) = AGO_RE.captures(&normalized) {
        let amount = match &caps[1] {
            "a" | "an" => 1,
            n => n.parse().map_err(|_| SinceError::OutOfRange { input: input.to_string() })?,
        };
        return shift_back(today, &caps[2], amount, input);
    }
    if let Some(caps) = LAST_RE.captures(&normalized) {
        return shift_back(today, &caps[1], 1, input);
    }

    const FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y", "%Y/%m/%d"];
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&normalized, f).ok())
        .ok_or_else(|| SinceError::Unrecognized { input: input.to_string() })
}

fn shift_back(today: NaiveDate, unit: &str, amount: u32, input: &str) -> Result<NaiveDate, SinceError> {
    let shifted = match unit {
        "day" => today.checked_sub_days(Days::new(u64::from(amount))),
        "week" => today.checked_sub_days(Days::new(u64::from(amount) * 7)),
        "month" => today.checked_sub_months(Months::new(amount)),
        "year" => amount
            .checked_mul(12)
            .and_then(|m| today.checked_sub_months(Months::new(m))),
        _ => None,
    };
    shifted.ok_or_else(|| SinceError::OutOfRange { input: input.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn highlight_dates() {
        assert_eq!(parse_highlight_date("June 1, 2020").unwrap(), d(2020, 6, 1));
        assert_eq!(parse_highlight_date(" December 25, 2019 ").unwrap(), d(2019, 12, 25));
        assert!(parse_highlight_date("2020-06-01").is_err());
        assert!(parse_highlight_date("Juné 1, 2020").is_err());
    }

    #[test]
    fn roam_ordinals() {
        assert_eq!(roam_date(d(2020, 6, 1)), "June 1st, 2020");
        assert_eq!(roam_date(d(2020, 6, 2)), "June 2nd, 2020");
        assert_eq!(roam_date(d(2020, 6, 3)), "June 3rd, 2020");
        assert_eq!(roam_date(d(2020, 6, 11)), "June 11th, 2020");
        assert_eq!(roam_date(d(2020, 6, 12)), "June 12th, 2020");
        assert_eq!(roam_date(d(2020, 6, 13)), "June 13th, 2020");
        assert_eq!(roam_date(d(2020, 6, 21)), "June 21st, 2020");
        assert_eq!(roam_date(d(2020, 6, 22)), "June 22nd, 2020");
        assert_eq!(roam_date(d(2020, 6, 30)), "June 30th, 2020");
    }

    #[test]
    fn markdown_dates() {
        assert_eq!(markdown_date(d(2020, 6, 5)), "[[2020-06-05]]");
    }

    #[test]
    fn since_absolute() {
        let today = d(2024, 3, 15);
        assert_eq!(parse_since("1970-01-01", today).unwrap(), d(1970, 1, 1));
        assert_eq!(parse_since("June 1, 2020", today).unwrap(), d(2020, 6, 1));
        assert_eq!(parse_since("jun 1, 2020", today).unwrap(), d(2020, 6, 1));
        assert_eq!(parse_since("1 June 2020", today).unwrap(), d(2020, 6, 1));
    }

    #[test]
    fn since_relative() {
        let today = d(2024, 3, 31);
        assert_eq!(parse_since("today", today).unwrap(), today);
        assert_eq!(parse_since("Yesterday", today).unwrap(), d(2024, 3, 30));
        assert_eq!(parse_since("3 days ago", today).unwrap(), d(2024, 3, 28));
        assert_eq!(parse_since("a week ago", today).unwrap(), d(2024, 3, 24));
        assert_eq!(parse_since("2 weeks  ago", today).unwrap(), d(2024, 3, 17));
        // clamps to end of month
        assert_eq!(parse_since("1 month ago", today).unwrap(), d(2024, 2, 29));
        assert_eq!(parse_since("last year", today).unwrap(), d(2023, 3, 31));
    }

    #[test]
    fn since_garbage_is_error() {
        let today = d(2024, 3, 15);
        assert!(matches!(
            parse_since("whenever", today),
            Err(SinceError::Unrecognized { .. })
        ));
        assert!(matches!(
            parse_since("99999999999 days ago", today),
            Err(SinceError::OutOfRange { .. })
        ));
    }
}
