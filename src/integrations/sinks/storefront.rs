use async_trait::async_trait;

use crate::integrations::traits::{ProductSink, SinkReport};
use crate::integrations::woocommerce::{NewProduct, WooCommerceClient};
use crate::models::ProductTable;
use crate::utils::error::Result;

/// Creates one storefront product per row.
///
/// Every run creates new products; rerunning with the same table duplicates them.
pub struct StorefrontSink {
    client: WooCommerceClient,
}

impl StorefrontSink {
    pub fn new(client: WooCommerceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductSink for StorefrontSink {
    fn name(&self) -> &str {
        "WooCommerce"
    }

    fn description(&self) -> &str {
        "Creates a WooCommerce product for every row"
    }

    fn is_idempotent(&self) -> bool {
        false
    }

    async fn write(&self, table: &ProductTable) -> Result<SinkReport> {
        let mut created = Vec::with_capacity(table.len());

        for row in &table.rows {
            let Some(payload) = NewProduct::from_merged(row) else {
                tracing::warn!("Skipping {}: no domain returned product data", row.asin);
                continue;
            };
            created.push(self.client.create_product(&payload).await?);
        }

        tracing::info!("Created {} of {} products", created.len(), table.len());
        Ok(SinkReport {
            rows_written: created.len(),
            cells_written: None,
            created,
        })
    }
}
