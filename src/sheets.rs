//! Spreadsheet store boundary: the `SheetStore` trait plus its HTTP
//! implementation over the Google Sheets v4 values/batchUpdate API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("worksheet '{0}' not found")]
    WorksheetNotFound(String),
    #[error("sheets api returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("sheets transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Everything the pipeline needs from the spreadsheet store.
pub trait SheetStore {
    fn spreadsheet_title(&self, spreadsheet_id: &str) -> Result<String, SheetsError>;
    /// All values of a worksheet as a 2D grid of strings. A missing
    /// worksheet is `WorksheetNotFound`, not an empty grid.
    fn read_values(&self, spreadsheet_id: &str, worksheet: &str)
        -> Result<Vec<Vec<String>>, SheetsError>;
    fn read_cell(&self, spreadsheet_id: &str, worksheet: &str, cell: &str)
        -> Result<Option<String>, SheetsError>;
    fn write_cell(&self, spreadsheet_id: &str, worksheet: &str, cell: &str, value: &str)
        -> Result<(), SheetsError>;
    /// Append after existing content; never truncates or reorders.
    fn append_rows(&self, spreadsheet_id: &str, worksheet: &str, rows: &[Vec<String>])
        -> Result<(), SheetsError>;
    fn add_worksheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), SheetsError>;
}

pub struct SheetsClient {
    token: String,
    client: Client,
}

impl SheetsClient {
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build Sheets HTTP client")?;
        Ok(Self { token, client })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.trim())
    }

    /// Convert a non-2xx response into a typed error. The values API
    /// reports an unknown worksheet as an unparseable range.
    fn check(
        resp: reqwest::blocking::Response,
        worksheet: Option<&str>,
    ) -> Result<reqwest::blocking::Response, SheetsError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp
            .text()
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        if status.as_u16() == 400 && body.contains("Unable to parse range") {
            if let Some(ws) = worksheet {
                return Err(SheetsError::WorksheetNotFound(ws.to_string()));
            }
        }
        Err(SheetsError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

impl SheetStore for SheetsClient {
    fn spreadsheet_title(&self, spreadsheet_id: &str) -> Result<String, SheetsError> {
        let url = format!("{}/{}?fields=properties.title", API_BASE, spreadsheet_id);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()?;
        let meta: SpreadsheetMeta = Self::check(resp, None)?.json()?;
        Ok(meta.properties.map(|p| p.title).unwrap_or_default())
    }

    fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = format!("{}/{}/values/{}", API_BASE, spreadsheet_id, worksheet);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()?;
        let range: ValueRange = Self::check(resp, Some(worksheet))?.json()?;
        Ok(range.values)
    }

    fn read_cell(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        cell: &str,
    ) -> Result<Option<String>, SheetsError> {
        let url = format!("{}/{}/values/{}!{}", API_BASE, spreadsheet_id, worksheet, cell);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.bearer())
            .send()?;
        let range: ValueRange = Self::check(resp, Some(worksheet))?.json()?;
        Ok(range.values.first().and_then(|row| row.first()).cloned())
    }

    fn write_cell(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        cell: &str,
        value: &str,
    ) -> Result<(), SheetsError> {
        let url = format!(
            "{}/{}/values/{}!{}?valueInputOption=RAW",
            API_BASE, spreadsheet_id, worksheet, cell
        );
        let body = ValueRange {
            values: vec![vec![value.to_string()]],
            ..Default::default()
        };
        let resp = self
            .client
            .put(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()?;
        Self::check(resp, Some(worksheet))?;
        Ok(())
    }

    fn append_rows(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED",
            API_BASE, spreadsheet_id, worksheet
        );
        let body = ValueRange {
            values: rows.to_vec(),
            ..Default::default()
        };
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()?;
        Self::check(resp, Some(worksheet))?;
        Ok(())
    }

    fn add_worksheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), SheetsError> {
        let url = format!("{}/{}:batchUpdate", API_BASE, spreadsheet_id);
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()?;
        Self::check(resp, None)?;
        Ok(())
    }
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    properties: Option<SpreadsheetProperties>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

// ── Test fake ──

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    use super::{SheetStore, SheetsError};

    /// In-memory `SheetStore` for component and pipeline tests. Cell
    /// addressing supports only A1, the single cell the pipeline touches.
    #[derive(Default)]
    pub struct FakeSheets {
        pub grids: RefCell<BTreeMap<(String, String), Vec<Vec<String>>>>,
        pub titles: RefCell<BTreeMap<String, String>>,
        pub fail_append: Cell<bool>,
        pub fail_write_cell: Cell<bool>,
        pub appends: Cell<usize>,
    }

    impl FakeSheets {
        pub fn grid(&self, spreadsheet_id: &str, worksheet: &str) -> Option<Vec<Vec<String>>> {
            self.grids
                .borrow()
                .get(&(spreadsheet_id.to_string(), worksheet.to_string()))
                .cloned()
        }
    }

    fn injected_failure() -> SheetsError {
        SheetsError::Api {
            status: 500,
            body: "injected failure".into(),
        }
    }

    impl SheetStore for FakeSheets {
        fn spreadsheet_title(&self, spreadsheet_id: &str) -> Result<String, SheetsError> {
            self.titles
                .borrow()
                .get(spreadsheet_id)
                .cloned()
                .ok_or_else(|| SheetsError::Api {
                    status: 404,
                    body: "spreadsheet not found".into(),
                })
        }

        fn read_values(
            &self,
            spreadsheet_id: &str,
            worksheet: &str,
        ) -> Result<Vec<Vec<String>>, SheetsError> {
            self.grids
                .borrow()
                .get(&(spreadsheet_id.to_string(), worksheet.to_string()))
                .cloned()
                .ok_or_else(|| SheetsError::WorksheetNotFound(worksheet.to_string()))
        }

        fn read_cell(
            &self,
            spreadsheet_id: &str,
            worksheet: &str,
            cell: &str,
        ) -> Result<Option<String>, SheetsError> {
            assert_eq!(cell, "A1");
            let grids = self.grids.borrow();
            let grid = grids
                .get(&(spreadsheet_id.to_string(), worksheet.to_string()))
                .ok_or_else(|| SheetsError::WorksheetNotFound(worksheet.to_string()))?;
            Ok(grid.first().and_then(|row| row.first()).cloned())
        }

        fn write_cell(
            &self,
            spreadsheet_id: &str,
            worksheet: &str,
            cell: &str,
            value: &str,
        ) -> Result<(), SheetsError> {
            assert_eq!(cell, "A1");
            if self.fail_write_cell.get() {
                return Err(injected_failure());
            }
            let mut grids = self.grids.borrow_mut();
            let grid = grids
                .get_mut(&(spreadsheet_id.to_string(), worksheet.to_string()))
                .ok_or_else(|| SheetsError::WorksheetNotFound(worksheet.to_string()))?;
            if grid.is_empty() {
                grid.push(Vec::new());
            }
            if grid[0].is_empty() {
                grid[0].push(String::new());
            }
            grid[0][0] = value.to_string();
            Ok(())
        }

        fn append_rows(
            &self,
            spreadsheet_id: &str,
            worksheet: &str,
            rows: &[Vec<String>],
        ) -> Result<(), SheetsError> {
            if self.fail_append.get() {
                return Err(injected_failure());
            }
            let mut grids = self.grids.borrow_mut();
            let grid = grids
                .get_mut(&(spreadsheet_id.to_string(), worksheet.to_string()))
                .ok_or_else(|| SheetsError::WorksheetNotFound(worksheet.to_string()))?;
            grid.extend(rows.iter().cloned());
            self.appends.set(self.appends.get() + 1);
            Ok(())
        }

        fn add_worksheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), SheetsError> {
            self.grids
                .borrow_mut()
                .insert((spreadsheet_id.to_string(), title.to_string()), Vec::new());
            Ok(())
        }
    }
}
