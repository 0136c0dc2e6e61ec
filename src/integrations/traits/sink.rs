use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::ProductTable;
use crate::utils::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkReport {
    pub rows_written: usize,
    pub cells_written: Option<usize>,
    /// Resources returned by sinks that create remote objects.
    pub created: Vec<serde_json::Value>,
}

/// Trait for implementing output destinations (CSV file, spreadsheet, storefront).
#[async_trait]
pub trait ProductSink: Send + Sync {
    /// Sink metadata
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Whether writing the same table twice leaves the store unchanged.
    fn is_idempotent(&self) -> bool;

    async fn write(&self, table: &ProductTable) -> Result<SinkReport>;
}
