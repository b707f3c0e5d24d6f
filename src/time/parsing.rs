use chrono::Datelike;

use super::{Date, DateTime};

/// Parses a date typed into a spreadsheet cell as text. Day-first formats win over month-first
/// ones since the workbooks are filled in by Brazilian teams.
pub fn parse_text_date(value: &str) -> Option<Date> {
    const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y-%m-%d"];
    const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];
    const SHORT_DATE_FORMATS: [&str; 3] = ["%d/%m/%y", "%d.%m.%y", "%d-%m-%y"];

    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // %Y accepts any number of digits, so "05/03/24" would be parsed as year 24
    let full_year = |date: Date| date.year() >= 1000;

    DATE_FORMATS.iter()
        .find_map(|format| Date::parse_from_str(value, format).ok().filter(|&date| full_year(date)))
        .or_else(|| DATE_TIME_FORMATS.iter().find_map(|format| {
            DateTime::parse_from_str(value, format).ok().map(|time| time.date()).filter(|&date| full_year(date))
        }))
        .or_else(|| SHORT_DATE_FORMATS.iter().find_map(|format| Date::parse_from_str(value, format).ok()))
}
