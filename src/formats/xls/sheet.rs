use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Dimensions, Range, Reader, Sheets, Xlsx, open_workbook, open_workbook_auto};

use crate::core::GenericResult;

use super::Cell;

static EMPTY_CELL: Cell = Cell::Empty;

/// A worksheet with its merged regions. Rows and columns are addressed by their absolute
/// zero-based positions in the sheet regardless of where the used range starts.
pub struct Sheet {
    pub name: String,
    range: Range<Cell>,
    merged_regions: Vec<Dimensions>,
}

impl Sheet {
    pub fn new(name: &str, range: Range<Cell>, merged_regions: Vec<Dimensions>) -> Sheet {
        Sheet {name: name.to_owned(), range, merged_regions}
    }

    pub fn cell(&self, row: u32, column: u32) -> &Cell {
        self.range.get_value((row, column)).unwrap_or(&EMPTY_CELL)
    }

    /// Number of rows counting from the top of the sheet up to the last used row.
    pub fn height(&self) -> u32 {
        self.range.end().map(|(row, _)| row + 1).unwrap_or(0)
    }

    /// Number of columns counting from column A up to the last used column.
    pub fn width(&self) -> u32 {
        self.range.end().map(|(_, column)| column + 1).unwrap_or(0)
    }

    pub fn row(&self, row: u32) -> Vec<&Cell> {
        (0..self.width()).map(|column| self.cell(row, column)).collect()
    }

    pub fn merged_regions(&self) -> &[Dimensions] {
        &self.merged_regions
    }
}

pub fn open_xlsx(path: &Path) -> GenericResult<Xlsx<BufReader<File>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    workbook.load_merged_regions()?;
    Ok(workbook)
}

pub fn read_xlsx_sheet(workbook: &mut Xlsx<BufReader<File>>, name: &str) -> GenericResult<Sheet> {
    let range = workbook.worksheet_range(name)?;
    let merged_regions = match workbook.worksheet_merge_cells(name) {
        Some(result) => result?,
        None => Vec::new(),
    };
    Ok(Sheet::new(name, range, merged_regions))
}

pub fn open_any(path: &Path) -> GenericResult<Sheets<BufReader<File>>> {
    Ok(open_workbook_auto(path)?)
}

pub fn read_sheet(workbook: &mut Sheets<BufReader<File>>, name: &str) -> GenericResult<Sheet> {
    let range = workbook.worksheet_range(name)?;
    Ok(Sheet::new(name, range, Vec::new()))
}

#[cfg(test)]
pub fn build_sheet(name: &str, cells: &[(u32, u32, Cell)], merged_regions: Vec<Dimensions>) -> Sheet {
    let end = cells.iter().fold((0, 0), |(rows, columns), (row, column, _)| {
        (rows.max(*row), columns.max(*column))
    });

    let mut range = Range::new((0, 0), end);
    for (row, column, cell) in cells {
        range.set_value((*row, *column), cell.clone());
    }

    Sheet::new(name, range, merged_regions)
}
