use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::Url;

use crate::config::{KEEPA_MAX_BATCH, KeepaConfig, require};
use crate::integrations::http::{decode, ensure_success};
use crate::integrations::traits::ProductDataProvider;
use crate::models::{Domain, RawRecord};
use crate::utils::error::{AppError, Result};

const SERVICE: &str = "keepa";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryResponse {
    #[serde(default)]
    categories: Option<HashMap<String, CategoryEntry>>,
    #[serde(default)]
    tokens_left: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    children: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BestSellersResponse {
    #[serde(default)]
    best_sellers_list: Option<BestSellersList>,
    #[serde(default)]
    tokens_left: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BestSellersList {
    #[serde(default)]
    asin_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductResponse {
    #[serde(default)]
    products: Option<Vec<RawRecord>>,
    #[serde(default)]
    tokens_left: Option<i64>,
}

/// Client for the Keepa REST API.
pub struct KeepaClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl KeepaClient {
    pub fn new(http: Client, base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Validation(format!("Invalid Keepa base URL '{}': {}", base_url, e)))?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &KeepaConfig, http: Client) -> Result<Self> {
        let api_key = require(&config.api_key, "keepa.api_key")?;
        Self::new(http, &config.base_url, api_key)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, domain: Domain, params: &[(&str, String)]) -> Result<T> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| AppError::Validation(format!("Invalid Keepa endpoint '{}': {}", endpoint, e)))?;

        tracing::debug!(endpoint, %domain, "Keepa request");

        let response = self
            .http
            .get(url)
            .query(&[("key", self.api_key.clone()), ("domain", domain.keepa_id().to_string())])
            .query(params)
            .send()
            .await?;

        let response = ensure_success(SERVICE, response).await?;
        decode(SERVICE, response).await
    }

    fn log_tokens(tokens_left: Option<i64>) {
        if let Some(tokens) = tokens_left {
            tracing::debug!(tokens_left = tokens, "Keepa token balance");
        }
    }
}

#[async_trait]
impl ProductDataProvider for KeepaClient {
    async fn resolve_subcategories(&self, category_id: i64, domain: Domain) -> Result<Vec<i64>> {
        tracing::info!("Getting subcategories of category {} ({})", category_id, domain);

        let response: CategoryResponse = self
            .get(
                "category",
                domain,
                &[("category", category_id.to_string()), ("parents", "0".to_string())],
            )
            .await?;
        Self::log_tokens(response.tokens_left);

        let entry = response
            .categories
            .and_then(|mut categories| categories.remove(&category_id.to_string()))
            .ok_or_else(|| AppError::not_found(format!("category {} in {}", category_id, domain)))?;

        let children = entry.children.unwrap_or_default();
        tracing::info!(
            "Category {} ({}) has {} subcategories",
            category_id,
            entry.name.as_deref().unwrap_or("unnamed"),
            children.len()
        );
        Ok(children)
    }

    async fn best_selling_identifiers(&self, subcategory_id: i64, domain: Domain) -> Result<Vec<String>> {
        let response: BestSellersResponse = self
            .get("bestsellers", domain, &[("category", subcategory_id.to_string())])
            .await?;
        Self::log_tokens(response.tokens_left);

        let list = response
            .best_sellers_list
            .ok_or_else(|| AppError::not_found(format!("best sellers for category {} in {}", subcategory_id, domain)))?;

        tracing::debug!("Category {} has {} best sellers", subcategory_id, list.asin_list.len());
        Ok(list.asin_list)
    }

    async fn fetch_records(&self, identifiers: &[String], domain: Domain) -> Result<Vec<RawRecord>> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        if identifiers.len() > KEEPA_MAX_BATCH {
            return Err(AppError::Validation(format!(
                "Keepa accepts at most {} identifiers per request, got {}",
                KEEPA_MAX_BATCH,
                identifiers.len()
            )));
        }

        tracing::info!("Getting product details for {} ASINs in {}", identifiers.len(), domain);

        let response: ProductResponse = self
            .get(
                "product",
                domain,
                &[("asin", identifiers.join(",")), ("buybox", "1".to_string())],
            )
            .await?;
        Self::log_tokens(response.tokens_left);

        let products = response.products.unwrap_or_default();
        if products.len() != identifiers.len() {
            tracing::warn!(
                "Keepa returned {} records for {} ASINs in {}",
                products.len(),
                identifiers.len(),
                domain
            );
        }
        Ok(products)
    }
}
