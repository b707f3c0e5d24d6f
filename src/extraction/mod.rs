//! Extracts per-discipline measurement tables from evidence workbooks.
//!
//! Measurement workbooks have a two-row header at rows 6-7 and data from row 8 up to the `TOTAL`
//! row. Only configured sheets are processed and only configured columns are kept.

mod filtering;
mod header;

use std::path::Path;

use calamine::Reader;
use log::{debug, error};

use crate::config::ExtractionConfig;
use crate::core::GenericResult;
use crate::dataset::{Dataset, SheetData, Value};
use crate::formats::xls::{self, Sheet};
use crate::time::Month;

const FIRST_DATA_ROW: u32 = 7;
const TOTAL_MARKER: &str = "TOTAL";

pub struct Extractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Extractor<'a> {
        Extractor {config}
    }

    /// Extracts the discipline's tables for the specified month. Any error is logged and results
    /// in no tables.
    pub fn extract(&self, path: &Path, month: Month, discipline: &str) -> Vec<SheetData> {
        match self.extract_tables(path, month, discipline) {
            Ok(tables) => tables,
            Err(err) => {
                error!("Failed to process {path:?}: {err}.");
                Vec::new()
            },
        }
    }

    fn extract_tables(&self, path: &Path, month: Month, discipline: &str) -> GenericResult<Vec<SheetData>> {
        let Some(allowed_sheets) = self.config.disciplines.get(discipline) else {
            debug!("There are no tables configured for {discipline:?} discipline.");
            return Ok(Vec::new());
        };

        let mut workbook = xls::open_any(path)?;
        let mut tables = Vec::new();

        for name in workbook.sheet_names() {
            if !allowed_sheets.contains(&name) || self.config.sheet_columns(&name).is_none() {
                debug!("Skipping {name:?} sheet of {path:?}.");
                continue;
            }

            let sheet = xls::read_sheet(&mut workbook, &name)?;
            if let Some(data) = self.process_sheet(&sheet, month) {
                tables.push(SheetData {name, data});
            }
        }

        Ok(tables)
    }

    /// Processes a sheet which must have a configured column list.
    pub fn process_sheet(&self, sheet: &Sheet, month: Month) -> Option<Dataset> {
        let columns = self.config.sheet_columns(&sheet.name)?;
        let names = header::build_names(sheet);

        let mut rows = Vec::new();
        for row in FIRST_DATA_ROW..sheet.height() {
            let cells = sheet.row(row);
            if cells.iter().any(|cell| xls::cell_text(cell).to_uppercase().contains(TOTAL_MARKER)) {
                break;
            }
            rows.push(cells.into_iter().map(xls::parse_cell).collect::<Vec<Value>>());
        }

        let mut data = Dataset::new(names, rows);

        if self.config.is_repeated_sheet(&sheet.name) {
            filtering::filter_repeated(&mut data, month, |name| self.config.is_protected_column(name));
        } else {
            filtering::filter_single(&mut data, month);
        }

        if data.is_empty() {
            debug!("{:?} sheet has no measurements for {}.", sheet.name, month);
            return None;
        }

        let mut data = data.select(columns);
        data.drop_empty_rows();
        data.rename_columns(&self.config.renames);

        for derived in self.config.derived_columns(&sheet.name) {
            if data.duplicate_column_before(&derived.source, &derived.name) {
                debug!("{:?} column has been added to {:?} sheet.", derived.name, sheet.name);
            }
        }

        Some(data)
    }
}
