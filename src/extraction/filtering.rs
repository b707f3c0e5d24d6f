use log::warn;

use crate::dataset::{Dataset, Value};
use crate::time::Month;

const MEASUREMENT_COLUMN: &str = "MEDIÇÃO";

fn is_measurement_column(name: &str) -> bool {
    name.to_uppercase().starts_with(MEASUREMENT_COLUMN)
}

fn matches(value: &Value, month: Month) -> bool {
    value.as_date().is_some_and(|date| month.contains(date))
}

/// Filters a sheet with a single measurement date column: only rows measured in the month are
/// kept.
pub fn filter_single(data: &mut Dataset, month: Month) {
    match data.column_index(MEASUREMENT_COLUMN) {
        Some(index) => data.retain_rows(|row| matches(&row[index], month)),
        None => {
            warn!("{MEASUREMENT_COLUMN:?} column is not found. Skipping all rows.");
            data.retain_rows(|_| false);
        },
    }
}

/// Filters a sheet where each measured value is followed by its own measurement date column.
///
/// Values measured outside of the month are cleared unless their column is protected (sample
/// identifiers), then the rows without any measurement in the month are dropped.
pub fn filter_repeated<P: Fn(&str) -> bool>(data: &mut Dataset, month: Month, is_protected: P) {
    let measurements: Vec<usize> = data.columns().iter().enumerate()
        .filter(|(_, column)| is_measurement_column(&column.name))
        .map(|(index, _)| index)
        .collect();

    let cleared: Vec<(usize, usize)> = measurements.iter()
        .filter(|&&index| index > 0 && !is_protected(&data.columns()[index - 1].name))
        .map(|&index| (index, index - 1))
        .collect();

    for row in data.rows_mut() {
        for &(date_index, value_index) in &cleared {
            if !matches(&row[date_index], month) {
                row[value_index] = Value::Empty;
            }
        }
    }

    data.retain_rows(|row| measurements.iter().any(|&index| matches(&row[index], month)));
}
