use std::collections::HashMap;

use crate::formats::xls::{self, Sheet};

const GROUP_HEADER_ROW: u32 = 5;
const HEADER_ROW: u32 = 6;

/// Builds column names from the two header rows: the lower label wins, the upper one is used when
/// the lower is empty. Repeated names get `_2`, `_3`, ... suffixes.
pub fn build_names(sheet: &Sheet) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    (0..sheet.width()).map(|column| {
        let label = [HEADER_ROW, GROUP_HEADER_ROW].iter()
            .map(|&row| xls::parse_cell(sheet.cell(row, column)).to_string())
            .find(|label| !label.is_empty())
            .unwrap_or_else(|| format!("Unnamed_{column}"));

        let count = counts.entry(label.clone()).or_default();
        *count += 1;

        if *count > 1 {
            format!("{label}_{count}")
        } else {
            label
        }
    }).collect()
}
