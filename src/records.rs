//! Records workbook reader.
//!
//! A records workbook contains one or more sheets with a two-row header at rows 13-14 and data
//! starting from row 15. The upper header row is only meaningful when it holds merged group
//! titles, so the header kind is detected from the sheet's merged regions.

use std::path::Path;

use log::{debug, warn};

use crate::core::GenericResult;
use crate::dataset::{Dataset, SheetData, Value};
use crate::formats::xls::{self, Sheet};
use crate::time::Month;

const GROUP_HEADER_ROW: u32 = 12;
const HEADER_ROW: u32 = 13;
const FIRST_DATA_ROW: u32 = 14;

pub const ROWS_PER_PAGE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Single,
    Multilevel,
}

/// Reads all record sheets of the workbook. Unreadable workbooks and sheets are skipped with a
/// warning.
pub fn read_records(path: &Path) -> Vec<SheetData> {
    let mut workbook = match xls::open_xlsx(path) {
        Ok(workbook) => workbook,
        Err(err) => {
            warn!("Unable to read {path:?}: {err}");
            return Vec::new();
        },
    };

    let mut sheets = Vec::new();

    for name in calamine::Reader::sheet_names(&workbook) {
        debug!("Processing {name:?} sheet...");

        let sheet = match xls::read_xlsx_sheet(&mut workbook, &name) {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!("Unable to read {name:?} sheet of {path:?}: {err}");
                continue;
            },
        };

        match parse_sheet(&sheet) {
            Some(data) => sheets.push(SheetData {name, data}),
            None => debug!("{name:?} sheet has no records. Skipping it."),
        }
    }

    sheets
}

pub fn parse_sheet(sheet: &Sheet) -> Option<Dataset> {
    if sheet.height() <= FIRST_DATA_ROW {
        debug!("{:?} sheet is too short to have records.", sheet.name);
        return None;
    }

    let names = header_names(sheet, detect_header(sheet));

    let rows = (FIRST_DATA_ROW..sheet.height()).map(|row| {
        (0..sheet.width()).map(|column| xls::parse_cell(sheet.cell(row, column))).collect()
    }).collect();

    let mut data = Dataset::new(names, rows);

    data.drop_empty_rows();
    if data.is_empty() {
        return None;
    }

    data.drop_empty_columns();
    data.drop_duplicate_columns();

    Some(data)
}

pub fn detect_header(sheet: &Sheet) -> HeaderKind {
    let grouped = sheet.merged_regions().iter().any(|region| {
        region.start.0 == GROUP_HEADER_ROW || region.end.0 == GROUP_HEADER_ROW
    });

    if grouped {
        HeaderKind::Multilevel
    } else {
        HeaderKind::Single
    }
}

fn header_names(sheet: &Sheet, kind: HeaderKind) -> Vec<String> {
    let label = |row, column| xls::parse_cell(sheet.cell(row, column)).to_string();

    (0..sheet.width()).map(|column| {
        let name = label(HEADER_ROW, column);

        match kind {
            HeaderKind::Single => name,
            HeaderKind::Multilevel => {
                let group = label(GROUP_HEADER_ROW, column);
                if group.is_empty() {
                    name
                } else {
                    format!("{group} - {name}").trim_matches([' ', '-']).to_owned()
                }
            },
        }
    }).collect()
}

/// Merges all sheets into a single dataset.
pub fn concat(sheets: &[SheetData]) -> Dataset {
    let datasets: Vec<&Dataset> = sheets.iter().map(|sheet| &sheet.data).collect();
    Dataset::concat(&datasets)
}

/// Selects records which date column value belongs to the specified month. Records with a
/// missing or unparsable date are filtered out.
pub fn filter_by_month(data: &Dataset, column: &str, month: Month) -> GenericResult<Dataset> {
    let index = data.column_index(column).ok_or_else(|| format!(
        "{column:?} column is not found in the records"))?;

    Ok(data.filter_rows(|row| {
        row[index].as_date().is_some_and(|date| month.contains(date))
    }))
}

pub struct Page<'a> {
    pub number: usize,
    pub count: usize,
    pub rows: &'a [Vec<Value>],
}

pub fn get_page(data: &Dataset, number: usize, rows_per_page: usize) -> GenericResult<Page<'_>> {
    let count = data.len().div_ceil(rows_per_page).max(1);
    if number < 1 || number > count {
        return Err!("Page must be between 1 and {}", count);
    }

    let start = (number - 1) * rows_per_page;
    let end = (start + rows_per_page).min(data.len());

    Ok(Page {number, count, rows: &data.rows()[start..end]})
}
