//! Runtime configuration: one explicit settings struct built at startup and
//! passed by reference into every component.

use anyhow::{bail, Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Pipeline settings, overridable via `CURATOR_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Spreadsheet holding the incoming rows and the checkpoint worksheet.
    pub source_spreadsheet_id: String,
    pub source_worksheet: String,
    /// Spreadsheet the curated rows are appended to.
    pub publish_spreadsheet_id: String,
    pub publish_worksheet: String,
    /// Sentinel worksheet holding the processed-rows cursor in cell A1.
    pub checkpoint_worksheet: String,
    /// Source column sent to the model and republished.
    pub text_field: String,
    /// Source column carrying the row's link, republished alongside the text.
    pub link_field: String,
    /// How many rows the model is asked to select per run.
    pub select_count: usize,
    pub model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_spreadsheet_id: String::new(),
            source_worksheet: "Sheet1".into(),
            publish_spreadsheet_id: String::new(),
            publish_worksheet: "test".into(),
            checkpoint_worksheet: "_checkpoint".into(),
            text_field: "Text".into(),
            link_field: "Tweet_link".into(),
            select_count: 5,
            model: "gpt-4-turbo".into(),
        }
    }
}

/// Process-wide credentials, read once at startup.
pub struct Secrets {
    pub sheets_token: String,
    pub openai_api_key: String,
}

pub fn load() -> Result<Settings> {
    let raw = Config::builder()
        .add_source(Environment::with_prefix("CURATOR"))
        .build()
        .context("failed to read environment configuration")?;
    let settings: Settings = raw
        .try_deserialize()
        .context("invalid CURATOR_* configuration")?;

    if settings.source_spreadsheet_id.is_empty() {
        bail!("CURATOR_SOURCE_SPREADSHEET_ID must be set");
    }
    if settings.publish_spreadsheet_id.is_empty() {
        bail!("CURATOR_PUBLISH_SPREADSHEET_ID must be set");
    }
    Ok(settings)
}

/// Missing credentials abort the run before any pipeline state is touched.
pub fn load_secrets() -> Result<Secrets> {
    let sheets_token = std::env::var("GOOGLE_SHEETS_TOKEN")
        .context("GOOGLE_SHEETS_TOKEN environment variable must be set")?;
    let openai_api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY environment variable must be set")?;
    Ok(Secrets {
        sheets_token,
        openai_api_key,
    })
}
