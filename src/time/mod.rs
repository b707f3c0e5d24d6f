#[cfg(test)]
macro_rules! date {
    ($year:expr, $month:expr, $day:expr) => (::chrono::NaiveDate::from_ymd_opt($year, $month, $day).unwrap())
}

mod month;
mod parsing;

pub use chrono::NaiveDate as Date;
pub use chrono::NaiveDateTime as DateTime;

pub use month::*;
pub use parsing::*;

pub fn format_date(date: Date) -> String {
    date.format("%d/%m/%Y").to_string()
}
