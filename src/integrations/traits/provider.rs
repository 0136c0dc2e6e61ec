use async_trait::async_trait;

use crate::models::{Domain, RawRecord};
use crate::utils::error::Result;

/// Trait for implementing product data lookups (Keepa, fixtures, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductDataProvider: Send + Sync {
    /// Child category ids of `category_id`; `NotFound` if the provider does not know it.
    async fn resolve_subcategories(&self, category_id: i64, domain: Domain) -> Result<Vec<i64>>;

    /// Ranked best-seller identifiers for one subcategory.
    async fn best_selling_identifiers(&self, subcategory_id: i64, domain: Domain) -> Result<Vec<String>>;

    /// Full records for a pre-chunked batch, one per identifier, in request order.
    async fn fetch_records(&self, identifiers: &[String], domain: Domain) -> Result<Vec<RawRecord>>;
}
