//! Calendar-date recognition and display formatting.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Month names, long forms first so `March` wins over `Mar`.
pub(crate) const MONTH: &str = r"(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)\.?";

pub(crate) static DAY_MONTH_YEAR: Lazy<String> =
    Lazy::new(|| format!(r"\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH},?\s+\d{{4}}"));
pub(crate) static MONTH_DAY_YEAR: Lazy<String> =
    Lazy::new(|| format!(r"{MONTH}\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}"));
pub(crate) static MONTH_YEAR: Lazy<String> = Lazy::new(|| format!(r"{MONTH}\s+\d{{4}}"));

static ANY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:{}|{}|\b\d{{4}}-\d{{2}}-\d{{2}}\b)",
        *MONTH_DAY_YEAR, *DAY_MONTH_YEAR
    ))
    .expect("valid regex")
});
static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid regex"));
static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));

const FORMATS: [&str; 5] = ["%B %d %Y", "%d %B %Y", "%b %d %Y", "%d %b %Y", "%Y-%m-%d"];

/// Finds the first full calendar date in `text` and parses it.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let found = ANY_DATE.find(text)?;
    let cleaned = ORDINAL.replace_all(found.as_str(), "$1");
    let cleaned = cleaned
        .replace(',', " ")
        .replace('.', " ")
        .replace(" of ", " ")
        .replace("Sept ", "Sep ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// `March 2, 1969`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Reformats the date found in `text`, or returns `text` unchanged when no
/// unambiguous calendar date is present.
pub fn reformat_or_verbatim(text: &str) -> String {
    parse_date(text)
        .map(format_date)
        .unwrap_or_else(|| text.trim().to_string())
}

/// Renders `{{start date|y|m|d}}`-style numeric parts.
pub fn format_parts(year: i32, month: Option<u32>, day: Option<u32>) -> Option<String> {
    match (month, day) {
        (Some(m), Some(d)) => NaiveDate::from_ymd_opt(year, m, d).map(format_date),
        (Some(m), None) => {
            NaiveDate::from_ymd_opt(year, m, 1).map(|date| date.format("%B %Y").to_string())
        }
        _ => Some(year.to_string()),
    }
}

/// `Year 1969` for a bare four-digit year, anything else unchanged.
pub fn label_bare_year(value: &str) -> String {
    if BARE_YEAR.is_match(value) {
        format!("Year {value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_shapes() {
        let expected = NaiveDate::from_ymd_opt(1969, 3, 2).unwrap();
        assert_eq!(parse_date("March 2, 1969"), Some(expected));
        assert_eq!(parse_date("2 March 1969"), Some(expected));
        assert_eq!(parse_date("2nd of March 1969"), Some(expected));
        assert_eq!(parse_date("1969-03-02"), Some(expected));
        assert_eq!(parse_date("on Mar. 2, 1969 at Toulouse"), Some(expected));
        assert_eq!(parse_date("Sept 30, 1968"), NaiveDate::from_ymd_opt(1968, 9, 30));
    }

    #[test]
    fn rejects_partial_dates() {
        assert_eq!(parse_date("March 1969"), None);
        assert_eq!(parse_date("31 February 1969"), None);
        assert_eq!(parse_date("sometime in 1969"), None);
    }

    #[test]
    fn reformat_roundtrips_unambiguous_dates() {
        assert_eq!(reformat_or_verbatim("March 2, 1969"), "March 2, 1969");
        assert_eq!(reformat_or_verbatim("9 February 1969"), "February 9, 1969");
        assert_eq!(reformat_or_verbatim("December 1947"), "December 1947");
    }

    #[test]
    fn formats_template_parts() {
        assert_eq!(format_parts(1969, Some(3), Some(2)).as_deref(), Some("March 2, 1969"));
        assert_eq!(format_parts(1969, Some(3), None).as_deref(), Some("March 1969"));
        assert_eq!(format_parts(1969, None, None).as_deref(), Some("1969"));
        assert_eq!(format_parts(1969, Some(13), Some(1)), None);
    }

    #[test]
    fn labels_bare_years() {
        assert_eq!(label_bare_year("1954"), "Year 1954");
        assert_eq!(label_bare_year("March 1954"), "March 1954");
    }
}
