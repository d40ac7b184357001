//! Durable progress cursor: a single count of already-published rows,
//! stored in one cell of a sentinel worksheet inside the source sheet.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Settings;
use crate::sheets::{SheetStore, SheetsError};

const CHECKPOINT_CELL: &str = "A1";

pub struct CheckpointStore<'a, S: SheetStore> {
    store: &'a S,
    spreadsheet_id: &'a str,
    worksheet: &'a str,
}

impl<'a, S: SheetStore> CheckpointStore<'a, S> {
    pub fn new(store: &'a S, cfg: &'a Settings) -> Self {
        Self {
            store,
            spreadsheet_id: &cfg.source_spreadsheet_id,
            worksheet: &cfg.checkpoint_worksheet,
        }
    }

    /// Number of rows already published. A missing sentinel worksheet is
    /// created on the spot with a zero cursor; an unparseable cell is
    /// treated as zero rather than failing the run. Only a transport
    /// failure against an existing worksheet is an error.
    pub fn read(&self) -> Result<usize> {
        let cell = match self
            .store
            .read_cell(self.spreadsheet_id, self.worksheet, CHECKPOINT_CELL)
        {
            Ok(cell) => cell,
            Err(SheetsError::WorksheetNotFound(_)) => {
                info!(
                    "Checkpoint worksheet '{}' missing, creating it with cursor 0",
                    self.worksheet
                );
                self.store
                    .add_worksheet(self.spreadsheet_id, self.worksheet)
                    .context("failed to create checkpoint worksheet")?;
                self.store
                    .write_cell(self.spreadsheet_id, self.worksheet, CHECKPOINT_CELL, "0")
                    .context("failed to seed checkpoint cell")?;
                return Ok(0);
            }
            Err(e) => return Err(e).context("failed to read checkpoint cell"),
        };
        Ok(parse_cursor(cell.as_deref()))
    }

    /// Single-cell overwrite. A failed write leaves the previously
    /// committed value intact; the caller decides how loudly to complain.
    pub fn write(&self, value: usize) -> Result<()> {
        self.store
            .write_cell(
                self.spreadsheet_id,
                self.worksheet,
                CHECKPOINT_CELL,
                &value.to_string(),
            )
            .with_context(|| format!("failed to write checkpoint {}", value))
    }
}

fn parse_cursor(cell: Option<&str>) -> usize {
    let Some(raw) = cell else { return 0 };
    match raw.trim().parse::<usize>() {
        Ok(v) => v,
        Err(_) => {
            warn!("Unparseable checkpoint value '{}', treating as 0", raw);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::fake::FakeSheets;

    fn cfg() -> Settings {
        Settings {
            source_spreadsheet_id: "src".into(),
            publish_spreadsheet_id: "dst".into(),
            ..Settings::default()
        }
    }

    fn seed(store: &FakeSheets, value: &str) {
        store.grids.borrow_mut().insert(
            ("src".to_string(), "_checkpoint".to_string()),
            vec![vec![value.to_string()]],
        );
    }

    #[test]
    fn missing_worksheet_created_with_zero() {
        let cfg = cfg();
        let store = FakeSheets::default();
        let cp = CheckpointStore::new(&store, &cfg);

        assert_eq!(cp.read().unwrap(), 0);
        assert_eq!(store.grid("src", "_checkpoint").unwrap()[0][0], "0");
    }

    #[test]
    fn write_then_read_round_trips() {
        let cfg = cfg();
        let store = FakeSheets::default();
        seed(&store, "0");
        let cp = CheckpointStore::new(&store, &cfg);

        cp.write(42).unwrap();
        assert_eq!(cp.read().unwrap(), 42);
        cp.write(43).unwrap();
        assert_eq!(cp.read().unwrap(), 43);
    }

    #[test]
    fn garbage_cell_treated_as_zero() {
        let cfg = cfg();
        let store = FakeSheets::default();
        seed(&store, "not a number");
        let cp = CheckpointStore::new(&store, &cfg);
        assert_eq!(cp.read().unwrap(), 0);
    }

    #[test]
    fn negative_cell_treated_as_zero() {
        let cfg = cfg();
        let store = FakeSheets::default();
        seed(&store, "-12");
        let cp = CheckpointStore::new(&store, &cfg);
        assert_eq!(cp.read().unwrap(), 0);
    }

    #[test]
    fn blank_cell_treated_as_zero() {
        let cfg = cfg();
        let store = FakeSheets::default();
        store.grids.borrow_mut().insert(
            ("src".to_string(), "_checkpoint".to_string()),
            vec![Vec::new()],
        );
        let cp = CheckpointStore::new(&store, &cfg);
        assert_eq!(cp.read().unwrap(), 0);
    }
}
