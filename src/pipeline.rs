//! Run orchestration: read the cursor, load the source, slice the new
//! window, curate, publish, and only then advance the cursor.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::Settings;
use crate::curator::{self, ChatModel};
use crate::publisher::{self, PublishRow};
use crate::sheets::SheetStore;
use crate::window;

/// How a run ended. Every variant is a normal process exit; only transport
/// failures against the source store escape as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing newer than the checkpoint.
    UpToDate,
    /// Curated rows published and the checkpoint advanced.
    Published,
    /// Curation yielded no usable selection; checkpoint untouched.
    CurationFailed,
    /// Destination write failed; checkpoint untouched.
    PublishFailed,
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub total_rows: usize,
    pub window: usize,
    pub curated: usize,
    pub published: usize,
    pub checkpoint: usize,
}

impl RunReport {
    pub fn print(&self) {
        match self.outcome {
            Outcome::UpToDate => println!(
                "Nothing to do: all {} rows already processed.",
                self.total_rows
            ),
            Outcome::Published => println!(
                "Published {} of {} new rows; checkpoint now {}.",
                self.published, self.window, self.checkpoint
            ),
            Outcome::CurationFailed => println!(
                "Curation failed for {} new rows; nothing published, checkpoint unchanged.",
                self.window
            ),
            Outcome::PublishFailed => println!(
                "Publish failed for {} curated rows; checkpoint unchanged.",
                self.curated
            ),
        }
    }
}

pub fn run_once<S: SheetStore, M: ChatModel>(
    store: &S,
    model: &M,
    cfg: &Settings,
) -> Result<RunReport> {
    let checkpoints = CheckpointStore::new(store, cfg);
    let checkpoint = checkpoints.read()?;

    let grid = store
        .read_values(&cfg.source_spreadsheet_id, &cfg.source_worksheet)
        .context("failed to read source worksheet")?;
    let rows = window::rows_from_grid(&grid);
    info!(
        "Loaded {} data rows from '{}', checkpoint {}",
        rows.len(),
        cfg.source_worksheet,
        checkpoint
    );

    let new_rows = window::select(&rows, checkpoint);
    if new_rows.is_empty() {
        info!("No rows newer than the checkpoint, nothing to do");
        return Ok(RunReport {
            outcome: Outcome::UpToDate,
            total_rows: rows.len(),
            window: 0,
            curated: 0,
            published: 0,
            checkpoint,
        });
    }

    // Blank texts keep their slot so reply ordinals stay aligned with rows
    let texts: Vec<String> = new_rows
        .iter()
        .map(|row| row.get(&cfg.text_field).unwrap_or_default().to_string())
        .collect();

    let Some(positions) = curator::select_best(model, &texts, cfg.select_count) else {
        warn!("Curation failed, run ends without publishing");
        return Ok(RunReport {
            outcome: Outcome::CurationFailed,
            total_rows: rows.len(),
            window: new_rows.len(),
            curated: 0,
            published: 0,
            checkpoint,
        });
    };

    let batch: Vec<PublishRow> = positions
        .iter()
        .map(|&pos| {
            let row = &new_rows[pos - 1];
            PublishRow {
                text: row.get(&cfg.text_field).unwrap_or_default().to_string(),
                link: row.get(&cfg.link_field).unwrap_or_default().to_string(),
            }
        })
        .collect();

    if !publisher::publish(store, cfg, &batch) {
        return Ok(RunReport {
            outcome: Outcome::PublishFailed,
            total_rows: rows.len(),
            window: new_rows.len(),
            curated: batch.len(),
            published: 0,
            checkpoint,
        });
    }

    let new_total = rows.len();
    if let Err(e) = checkpoints.write(new_total) {
        // Published but not recorded; the next run re-sends this window
        error!("Checkpoint write failed after publish: {:#}", e);
    }

    Ok(RunReport {
        outcome: Outcome::Published,
        total_rows: rows.len(),
        window: new_rows.len(),
        curated: batch.len(),
        published: batch.len(),
        checkpoint: new_total,
    })
}

// ── Status ──

pub struct SourceStatus {
    pub total_rows: usize,
    pub checkpoint: usize,
    pub pending: usize,
}

pub fn source_status<S: SheetStore>(store: &S, cfg: &Settings) -> Result<SourceStatus> {
    let checkpoints = CheckpointStore::new(store, cfg);
    let checkpoint = checkpoints.read()?;
    let grid = store
        .read_values(&cfg.source_spreadsheet_id, &cfg.source_worksheet)
        .context("failed to read source worksheet")?;
    let total_rows = grid.len().saturating_sub(1);
    Ok(SourceStatus {
        total_rows,
        checkpoint,
        pending: total_rows.saturating_sub(checkpoint),
    })
}
