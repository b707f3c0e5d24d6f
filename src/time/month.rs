use std::fmt;

use chrono::Datelike;

use crate::core::GenericResult;

use super::Date;

/// A (year, month) pair which report periods and filters are scoped to.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Month {
    year: i32,
    month: u32,
}

impl From<Date> for Month {
    fn from(date: Date) -> Self {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl Month {
    pub fn new(year: i32, month: u32) -> GenericResult<Month> {
        if !(1..=12).contains(&month) || Date::from_ymd_opt(year, month, 1).is_none() {
            return Err!("Invalid month: {:02}/{}", month, year);
        }
        Ok(Month {year, month})
    }

    /// Parses user input in `MM.YYYY`, `MM/YYYY` or `YYYY-MM` format.
    pub fn parse(value: &str) -> GenericResult<Month> {
        let value = value.trim();

        let parsed = if let Some((year, month)) = value.split_once('-') {
            Some((year, month))
        } else {
            value.split_once(['.', '/']).map(|(month, year)| (year, month))
        };

        let (year, month) = parsed
            .and_then(|(year, month)| {
                if year.len() != 4 || month.is_empty() || month.len() > 2 {
                    return None;
                }
                Some((year.parse::<i32>().ok()?, month.parse::<u32>().ok()?))
            })
            .ok_or_else(|| format!("Invalid month: {value:?}. Expected MM.YYYY format"))?;

        Month::new(year, month)
    }

    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}
