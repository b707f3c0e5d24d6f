use crate::dataset::Value;
use crate::time;

pub use calamine::Data as Cell;

/// Converts a raw cell to a dataset value: dates stay dates, everything else keeps the text
/// representation it has in the spreadsheet.
pub fn parse_cell(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Empty,
        Cell::String(value) => {
            let value = value.trim();
            if value.is_empty() {
                Value::Empty
            } else {
                Value::text(value)
            }
        },
        Cell::Int(value) => Value::Number(*value as f64),
        Cell::Float(value) => Value::Number(*value),
        Cell::Bool(value) => Value::Text(value.to_string()),
        Cell::DateTime(value) => match value.as_datetime() {
            Some(datetime) => Value::Date(datetime.date()),
            None => Value::Number(value.as_f64()),
        },
        Cell::DateTimeIso(value) => match time::parse_text_date(value) {
            Some(date) => Value::Date(date),
            None => Value::text(value),
        },
        Cell::DurationIso(value) => Value::text(value),
        Cell::Error(error) => Value::Text(format!("#{error:?}")),
    }
}

#[cfg(test)]
mod tests {
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use rstest::rstest;
    use super::*;

    #[rstest(cell, expected,
        case(Cell::Empty, Value::Empty),
        case(Cell::String(s!("  ")), Value::Empty),
        case(Cell::String(s!(" SP-01 ")), Value::text("SP-01")),
        case(Cell::Int(42), Value::Number(42.0)),
        case(Cell::Float(1.5), Value::Number(1.5)),
        case(Cell::Bool(true), Value::text("true")),
        case(Cell::DateTimeIso(s!("2024-03-05T00:00:00")), Value::Date(date!(2024, 3, 5))),
        case(Cell::DateTime(ExcelDateTime::new(45356.0, ExcelDateTimeType::DateTime, false)), Value::Date(date!(2024, 3, 5))),
    )]
    fn parse(cell: Cell, expected: Value) {
        assert_eq!(parse_cell(&cell), expected);
    }
}
