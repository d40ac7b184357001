//! Destination writes: append-only publish of the curated batch, creating
//! the destination worksheet and its header row on demand.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Settings;
use crate::sheets::{SheetStore, SheetsError};

/// One published row, reduced to the two public columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRow {
    pub text: String,
    pub link: String,
}

/// Append the curated batch to the destination worksheet. Every write
/// error is logged and reported as `false` so the checkpoint never
/// advances past an unconfirmed publish. An empty batch is a no-op
/// success without touching the store.
pub fn publish<S: SheetStore>(store: &S, cfg: &Settings, batch: &[PublishRow]) -> bool {
    if batch.is_empty() {
        info!("Empty publish batch, nothing to write");
        return true;
    }
    match try_publish(store, cfg, batch) {
        Ok(()) => {
            info!(
                "Published {} rows to worksheet '{}'",
                batch.len(),
                cfg.publish_worksheet
            );
            true
        }
        Err(e) => {
            warn!("Publish failed, checkpoint will not advance: {:#}", e);
            false
        }
    }
}

fn try_publish<S: SheetStore>(store: &S, cfg: &Settings, batch: &[PublishRow]) -> Result<()> {
    let existing = match store.read_values(&cfg.publish_spreadsheet_id, &cfg.publish_worksheet) {
        Ok(values) => values,
        Err(SheetsError::WorksheetNotFound(_)) => {
            info!(
                "Destination worksheet '{}' missing, creating it",
                cfg.publish_worksheet
            );
            store
                .add_worksheet(&cfg.publish_spreadsheet_id, &cfg.publish_worksheet)
                .context("failed to create destination worksheet")?;
            Vec::new()
        }
        Err(e) => return Err(e).context("failed to read destination worksheet"),
    };

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(batch.len() + 1);
    if existing.is_empty() {
        rows.push(vec![cfg.text_field.clone(), cfg.link_field.clone()]);
    }
    rows.extend(batch.iter().map(|r| vec![r.text.clone(), r.link.clone()]));

    store
        .append_rows(&cfg.publish_spreadsheet_id, &cfg.publish_worksheet, &rows)
        .context("failed to append curated rows")
}
