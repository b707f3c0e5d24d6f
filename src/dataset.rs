//! Typed tabular data loaded from spreadsheets.
//!
//! Sheets have no fixed schema, so a dataset is an ordered list of named columns. Each column
//! declares the kind of values it holds, which is resolved from the values when the dataset is
//! built.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::time::{self, Date};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
    Date(Date),
}

impl Value {
    pub fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(value) => value.is_empty(),
            Value::Number(_) | Value::Date(_) => false,
        }
    }

    /// Interprets the value as a date: either a real date cell or a date typed as text.
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Value::Date(date) => Some(*date),
            Value::Text(value) => time::parse_text_date(value),
            Value::Empty | Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(value) => f.write_str(value),
            Value::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            },
            Value::Date(date) => f.write_str(&time::format_date(*date)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A dataset read from a named workbook sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub data: Dataset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset padding or truncating every row to the number of columns.
    pub fn new<N: Into<String>>(names: Vec<N>, rows: Vec<Vec<Value>>) -> Dataset {
        let width = names.len();
        let rows = rows.into_iter().map(|mut row| {
            row.resize(width, Value::Empty);
            row
        }).collect();

        let mut dataset = Dataset {
            columns: names.into_iter().map(|name| Column {
                name: name.into(),
                kind: ColumnKind::Text,
            }).collect(),
            rows,
        };
        dataset.resolve_kinds();
        dataset
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn retain_rows<F: FnMut(&[Value]) -> bool>(&mut self, mut keep: F) {
        self.rows.retain(|row| keep(row));
    }

    /// Returns a new dataset with the rows matching the predicate.
    pub fn filter_rows<F: FnMut(&[Value]) -> bool>(&self, mut keep: F) -> Dataset {
        let mut dataset = Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        };
        dataset.resolve_kinds();
        dataset
    }

    pub fn drop_empty_rows(&mut self) {
        self.rows.retain(|row| !row.iter().all(Value::is_empty));
    }

    pub fn drop_empty_columns(&mut self) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|index| !self.column_values(index).all(Value::is_empty))
            .collect();
        self.retain_columns(&keep);
    }

    /// Drops columns whose name has already been seen, keeping the first occurrence.
    pub fn drop_duplicate_columns(&mut self) {
        let mut seen = HashSet::new();
        let keep: Vec<bool> = self.columns.iter()
            .map(|column| seen.insert(column.name.clone()))
            .collect();
        self.retain_columns(&keep);
    }

    /// Selects the listed columns which are present in the dataset, in the list order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Dataset {
        let indices: Vec<usize> = names.iter()
            .filter_map(|name| self.column_index(name.as_ref()))
            .collect();

        let mut dataset = Dataset {
            columns: indices.iter().map(|&index| self.columns[index].clone()).collect(),
            rows: self.rows.iter().map(|row| {
                indices.iter().map(|&index| row[index].clone()).collect()
            }).collect(),
        };
        dataset.resolve_kinds();
        dataset
    }

    pub fn rename_columns(&mut self, renames: &HashMap<String, String>) {
        for column in &mut self.columns {
            if let Some(name) = renames.get(&column.name) {
                column.name.clone_from(name);
            }
        }
    }

    /// Inserts a copy of the source column under a new name right before the source column.
    pub fn duplicate_column_before(&mut self, source: &str, name: &str) -> bool {
        let Some(index) = self.column_index(source) else {
            return false;
        };

        let mut column = self.columns[index].clone();
        column.name = name.to_owned();
        self.columns.insert(index, column);

        for row in &mut self.rows {
            let value = row[index].clone();
            row.insert(index, value);
        }

        true
    }

    /// Concatenates datasets: columns are united in order of their first appearance.
    pub fn concat(datasets: &[&Dataset]) -> Dataset {
        let mut names: Vec<String> = Vec::new();
        for dataset in datasets {
            for column in &dataset.columns {
                if !names.contains(&column.name) {
                    names.push(column.name.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for dataset in datasets {
            let mapping: Vec<Option<usize>> = names.iter()
                .map(|name| dataset.column_index(name))
                .collect();

            for row in &dataset.rows {
                rows.push(mapping.iter().map(|index| match index {
                    Some(index) => row[*index].clone(),
                    None => Value::Empty,
                }).collect());
            }
        }

        Dataset::new(names, rows)
    }

    fn retain_columns(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));

        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    fn resolve_kinds(&mut self) {
        for index in 0..self.columns.len() {
            let mut values = self.rows.iter()
                .map(|row| &row[index])
                .filter(|value| !value.is_empty())
                .peekable();

            let is_date = values.peek().is_some() && values.all(|value| matches!(value, Value::Date(_)));
            self.columns[index].kind = if is_date {
                ColumnKind::Date
            } else {
                ColumnKind::Text
            };
        }
    }
}
