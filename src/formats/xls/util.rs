use super::Cell;

/// Returns the cell text as it is shown in the spreadsheet (used for sentinel detection).
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::String(value) | Cell::DateTimeIso(value) | Cell::DurationIso(value) => value.clone(),
        _ => cell.to_string(),
    }
}
