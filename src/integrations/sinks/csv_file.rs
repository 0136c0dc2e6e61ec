use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::integrations::traits::{ProductSink, SinkReport};
use crate::models::ProductTable;
use crate::utils::error::Result;

/// Writes the table to a UTF-8, comma-delimited file, replacing any previous content.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProductSink for CsvSink {
    fn name(&self) -> &str {
        "CSV File"
    }

    fn description(&self) -> &str {
        "Writes a header and one row per product to a local CSV file"
    }

    fn is_idempotent(&self) -> bool {
        true
    }

    async fn write(&self, table: &ProductTable) -> Result<SinkReport> {
        tracing::info!("Writing CSV file {}", self.path.display());

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(table.header())?;
        for record in table.records() {
            writer.write_record(&record)?;
        }
        writer.flush()?;

        tracing::info!("CSV file written with {} rows", table.len());
        Ok(SinkReport {
            rows_written: table.len(),
            cells_written: None,
            created: Vec::new(),
        })
    }
}
