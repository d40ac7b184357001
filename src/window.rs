//! Row construction and the checkpoint window: the contiguous slice of
//! source rows not yet published.

use crate::headers;

/// One source row: normalized field names zipped with raw cell values.
/// Order follows the physical column order and never changes after read.
#[derive(Debug, Clone)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    fn from_raw(fields: &[String], raw: &[String]) -> Self {
        let cells = fields
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), raw.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { cells }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }
}

/// Build rows from a whole-sheet grid: first line is the header, the rest
/// are data. Short lines pad with empty strings, surplus cells beyond the
/// header width are dropped.
pub fn rows_from_grid(grid: &[Vec<String>]) -> Vec<Row> {
    let Some((header, data)) = grid.split_first() else {
        return Vec::new();
    };
    let fields = headers::normalize(header);
    data.iter().map(|line| Row::from_raw(&fields, line)).collect()
}

/// Rows newer than the checkpoint, in source order. Empty when the cursor
/// has caught up with the end of the sheet; that is a normal terminal
/// condition, not a failure.
pub fn select(rows: &[Row], checkpoint: usize) -> &[Row] {
    if checkpoint >= rows.len() {
        &[]
    } else {
        &rows[checkpoint..]
    }
}
