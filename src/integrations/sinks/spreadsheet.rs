use async_trait::async_trait;

use crate::integrations::traits::{ProductSink, SinkReport, SourceList};
use crate::models::ProductTable;
use crate::utils::error::Result;

/// Writes the table's data rows below the header of a spreadsheet range.
///
/// A sink built with [`SpreadsheetSink::with_header`] owns its range and
/// rewrites the header row too; otherwise the existing header is left alone.
pub struct SpreadsheetSink {
    target: Box<dyn SourceList>,
    write_header: bool,
}

impl SpreadsheetSink {
    pub fn new(target: Box<dyn SourceList>) -> Self {
        Self {
            target,
            write_header: false,
        }
    }

    pub fn with_header(target: Box<dyn SourceList>) -> Self {
        Self {
            target,
            write_header: true,
        }
    }
}

#[async_trait]
impl ProductSink for SpreadsheetSink {
    fn name(&self) -> &str {
        "Spreadsheet"
    }

    fn description(&self) -> &str {
        "Overwrites the data rows of a spreadsheet range"
    }

    fn is_idempotent(&self) -> bool {
        true
    }

    async fn write(&self, table: &ProductTable) -> Result<SinkReport> {
        let rows = table.records();
        tracing::info!("Writing {} rows to {}", rows.len(), self.target.name());

        let mut cells = 0;
        if self.write_header {
            cells += self.target.write_header(&table.header()).await?;
        }
        cells += self.target.write_rows(&rows).await?;
        Ok(SinkReport {
            rows_written: rows.len(),
            cells_written: Some(cells),
            created: Vec::new(),
        })
    }
}
