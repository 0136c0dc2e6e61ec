use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::sync::OnceLock;
use url::Url;

use crate::config::{SheetsConfig, require};
use crate::integrations::http::{decode, ensure_success};
use crate::integrations::traits::SourceList;
use crate::utils::error::{AppError, Result};

const SERVICE: &str = "google-sheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_cells: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
}

/// Resolves the bearer token: `sheets.access_token` first, then the credentials file.
///
/// The credentials file must hold an already-issued OAuth token
/// (`{"access_token": "..."}`); exchanging service-account keys is left to
/// external tooling such as `gcloud auth print-access-token`.
pub fn load_access_token(config: &SheetsConfig) -> Result<String> {
    if let Ok(token) = require(&config.access_token, "sheets.access_token") {
        return Ok(token.to_string());
    }

    let path = require(&config.credentials_file, "sheets.credentials_file")?;
    let contents = fs::read_to_string(path)?;
    let file: TokenFile = serde_json::from_str(&contents)?;

    file.access_token
        .or(file.token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            let hint = if file.private_key.is_some() {
                "service-account keys must be exchanged for an access token first"
            } else {
                "no access_token field"
            };
            AppError::Validation(format!("Credentials file {}: {}", path, hint))
        })
}

fn a1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?P<sheet>.+)!)?(?P<c1>[A-Za-z]{1,3})(?P<r1>\d+)?(?::(?P<c2>[A-Za-z]{1,3})(?P<r2>\d+)?)?$")
            .expect("A1 range pattern is valid")
    })
}

/// `A` = 1, `Z` = 26, `AA` = 27.
fn column_number(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0, |n, b| n * 26 + usize::from(b.to_ascii_uppercase() - b'A' + 1))
}

/// A configured A1 range split into its header row and the data rows below it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DataRange {
    sheet: Option<String>,
    start_col: String,
    end_col: String,
    header_row: usize,
    last_row: Option<usize>,
}

impl DataRange {
    fn parse(range: &str) -> Result<Self> {
        let range = range.trim();

        // `MX` or `Sheet1` name a whole sheet; only ranges with a row or a colon are cell references
        let is_reference = range.contains(':') || range.chars().any(|c| c.is_ascii_digit());
        if !range.is_empty() && !range.contains('!') && !(is_reference && a1_pattern().is_match(range)) {
            return Ok(Self {
                sheet: Some(range.to_string()),
                start_col: "A".to_string(),
                end_col: "ZZZ".to_string(),
                header_row: 1,
                last_row: None,
            });
        }

        let caps = a1_pattern()
            .captures(range)
            .ok_or_else(|| AppError::Validation(format!("Unsupported A1 range: '{}'", range)))?;

        let row = |name: &str| -> Result<Option<usize>> {
            caps.name(name)
                .map(|m| m.as_str().parse())
                .transpose()
                .map_err(|_| AppError::Validation(format!("Invalid row in '{}'", range)))
        };
        let header_row = row("r1")?.unwrap_or(1);
        let last_row = row("r2")?;

        let start_col = caps["c1"].to_string();
        let end_col = caps.name("c2").map_or_else(|| start_col.clone(), |m| m.as_str().to_string());
        if column_number(&end_col) < column_number(&start_col) {
            return Err(AppError::Validation(format!("Range '{}' ends before it starts", range)));
        }
        if last_row.is_some_and(|last| last <= header_row) {
            return Err(AppError::Validation(format!("Range '{}' has no rows below its header", range)));
        }

        Ok(Self {
            sheet: caps.name("sheet").map(|m| m.as_str().to_string()),
            start_col,
            end_col,
            header_row,
            last_row,
        })
    }

    fn width(&self) -> usize {
        column_number(&self.end_col) - column_number(&self.start_col) + 1
    }

    /// Data rows available below the header, if the range is bounded.
    fn capacity(&self) -> Option<usize> {
        self.last_row.map(|last| last - self.header_row)
    }

    fn render(&self, first: usize, last: Option<usize>) -> String {
        let mut out = String::new();
        if let Some(sheet) = &self.sheet {
            out.push_str(sheet);
            out.push('!');
        }
        out.push_str(&format!("{}{}:{}", self.start_col, first, self.end_col));
        if let Some(last) = last {
            out.push_str(&last.to_string());
        }
        out
    }

    fn header(&self) -> String {
        self.render(self.header_row, Some(self.header_row))
    }

    fn data(&self) -> String {
        self.render(self.header_row + 1, self.last_row)
    }

    /// The part of the data range below the first `written` rows, if any is left.
    fn rows_after(&self, written: usize) -> Option<String> {
        let first = self.header_row + 1 + written;
        match self.last_row {
            Some(last) if first > last => None,
            last => Some(self.render(first, last)),
        }
    }

    fn check_fits(&self, rows: &[Vec<String>]) -> Result<()> {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        if widest > self.width() {
            return Err(AppError::Validation(format!(
                "Rows have {} columns but range {} holds {}",
                widest,
                self.data(),
                self.width()
            )));
        }
        if let Some(capacity) = self.capacity() {
            if rows.len() > capacity {
                return Err(AppError::Validation(format!(
                    "{} rows do not fit in range {} ({} rows)",
                    rows.len(),
                    self.data(),
                    capacity
                )));
            }
        }
        Ok(())
    }
}

/// Shifts an A1 range down by one row so the header row is excluded.
///
/// `Products!A1:K` becomes `Products!A2:K`; a bare sheet name covers every column.
pub fn data_range(range: &str) -> Result<String> {
    Ok(DataRange::parse(range)?.data())
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google Sheets v4 values API bound to one spreadsheet range.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    range: String,
    token: String,
}

impl SheetsClient {
    pub fn new(
        http: Client,
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Validation(format!("Invalid Sheets base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!("Invalid Sheets base URL '{}'", base_url)));
        }
        Ok(Self {
            http,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &SheetsConfig, http: Client) -> Result<Self> {
        let spreadsheet_id = require(&config.spreadsheet_id, "sheets.spreadsheet_id")?;
        let range = require(&config.range, "sheets.range")?;
        let token = load_access_token(config)?;
        Self::new(http, &config.base_url, spreadsheet_id, range, token)
    }

    /// Same spreadsheet and credentials, different range.
    pub fn with_range(&self, range: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            ..self.clone()
        }
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    fn values_url(&self, range: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        }
        url
    }

    pub async fn get_values(&self) -> Result<Vec<Vec<String>>> {
        let response = self
            .http
            .get(self.values_url(&self.range))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: ValueRange = decode(SERVICE, response).await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    pub async fn clear_values(&self, range: &str) -> Result<()> {
        let url = self.values_url(&format!("{}:clear", range));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    /// Writes `rows` verbatim (`RAW` input) starting at `range`.
    pub async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<usize> {
        let response = self
            .http
            .put(self.values_url(range))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&json!({
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: UpdateValuesResponse = decode(SERVICE, response).await?;
        Ok(body.updated_cells.unwrap_or(0))
    }
}

#[async_trait]
impl SourceList for SheetsClient {
    fn name(&self) -> &str {
        "Google Sheets"
    }

    async fn read_table(&self) -> Result<Vec<Vec<String>>> {
        let values = self.get_values().await?;
        tracing::debug!("Read {} rows from {}", values.len(), self.range);
        Ok(values)
    }

    async fn write_rows(&self, rows: &[Vec<String>]) -> Result<usize> {
        let target = DataRange::parse(&self.range)?;
        target.check_fits(rows)?;

        let mut cells = 0;
        if !rows.is_empty() {
            cells = self.update_values(&target.data(), rows).await?;
        }

        // Rows left over from a longer previous write
        if let Some(stale) = target.rows_after(rows.len()) {
            self.clear_values(&stale).await?;
        }

        tracing::info!("Wrote {} rows ({} cells) to {}", rows.len(), cells, target.data());
        Ok(cells)
    }

    async fn write_header(&self, header: &[String]) -> Result<usize> {
        let target = DataRange::parse(&self.range)?;
        let row = vec![header.to_vec()];
        target.check_fits(&row)?;
        self.update_values(&target.header(), &row).await
    }
}
