//! This module provides a thin wrapper around prettytable.

use prettytable::{Row as RawRow, Cell as RawCell};
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};

use crate::dataset::{ColumnKind, Dataset, Value};
use crate::time::{self, Date};

pub use prettytable::{Table, format::Alignment};

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    text: String,
    align: Alignment,
}

impl Cell {
    pub fn new(text: &str) -> Cell {
        Cell::new_align(text, Alignment::LEFT)
    }

    pub fn new_align(text: &str, align: Alignment) -> Cell {
        Cell {
            text: text.to_owned(),
            align: align,
        }
    }

    pub fn new_date(date: Date) -> Cell {
        Cell::new_align(&time::format_date(date), Alignment::CENTER)
    }

    pub fn new_value(value: &Value, kind: ColumnKind) -> Cell {
        match value {
            Value::Number(_) => Cell::new_align(&value.to_string(), Alignment::RIGHT),
            Value::Date(date) => Cell::new_date(*date),
            Value::Empty if kind == ColumnKind::Date => Cell::new_align("", Alignment::CENTER),
            Value::Text(_) | Value::Empty => Cell::new(&value.to_string()),
        }
    }
}

pub struct Row {
}

impl Row {
    pub fn new(row: &[Cell]) -> RawRow {
        let mut cells = Vec::with_capacity(row.len());

        for cell in row {
            cells.push(RawCell::new_align(&cell.text, cell.align));
        }

        RawRow::new(cells)
    }
}

pub fn build_table(rows: &[Vec<Value>], data: &Dataset) -> Table {
    let mut table = Table::new();

    for row in rows {
        let cells: Vec<Cell> = row.iter().zip(data.columns())
            .map(|(value, column)| Cell::new_value(value, column.kind))
            .collect();
        table.add_row(Row::new(&cells));
    }

    table
}

pub fn print_table(name: &str, titles: &[&str], mut table: Table) {
    table.set_format(FormatBuilder::new().padding(1, 1).build());
    table.set_titles(RawRow::new(
        titles.iter().map(|name| RawCell::new_align(name, Alignment::CENTER)).collect()));

    let mut wrapping_table = Table::new();

    wrapping_table.set_format(FormatBuilder::new()
        .separator(LinePosition::Title, LineSeparator::new(' ', ' ', ' ', ' '))
        .build());

    wrapping_table.set_titles(RawRow::new(vec![
        RawCell::new_align(&("\n".to_owned() + name), Alignment::CENTER),
    ]));

    wrapping_table.add_row(RawRow::new(vec![RawCell::new(&table.to_string())]));
    wrapping_table.printstd();
}
