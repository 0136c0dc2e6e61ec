use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::config::{WooCommerceConfig, require};
use crate::integrations::http::{decode, ensure_success};
use crate::models::MergedProduct;
use crate::utils::error::{AppError, Result};

const SERVICE: &str = "woocommerce";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductImage {
    pub src: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductAttribute {
    pub name: String,
    pub options: Vec<String>,
    pub visible: bool,
}

/// Payload for `POST /products`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewProduct {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sku: String,
    pub regular_price: String,
    pub description: String,
    pub short_description: String,
    pub images: Vec<ProductImage>,
    pub attributes: Vec<ProductAttribute>,
}

impl NewProduct {
    /// Builds a simple product from the first domain that has a listing.
    pub fn from_merged(row: &MergedProduct) -> Option<Self> {
        let (_, product) = row.primary()?;

        let short_description = if product.features.is_empty() {
            String::new()
        } else {
            let items: String = product
                .features
                .iter()
                .map(|feature| format!("<li>{}</li>", feature))
                .collect();
            format!("<ul>{}</ul>", items)
        };

        let attributes = product
            .brand
            .as_ref()
            .filter(|brand| !brand.is_empty())
            .map(|brand| ProductAttribute {
                name: "Brand".to_string(),
                options: vec![brand.clone()],
                visible: true,
            })
            .into_iter()
            .collect();

        Some(Self {
            name: product.title.clone().unwrap_or_else(|| row.asin.clone()),
            kind: "simple".to_string(),
            sku: row.asin.clone(),
            regular_price: product.price.to_string(),
            description: product.description.clone().unwrap_or_default(),
            short_description,
            images: product
                .images
                .iter()
                .map(|src| ProductImage { src: src.clone() })
                .collect(),
            attributes,
        })
    }
}

/// WooCommerce REST client authenticated with a consumer key/secret pair.
pub struct WooCommerceClient {
    http: Client,
    products_url: Url,
    consumer_key: String,
    consumer_secret: String,
}

impl WooCommerceClient {
    pub fn new(
        http: Client,
        store_url: &str,
        api_version: &str,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Result<Self> {
        let base = format!(
            "{}/wp-json/{}/products",
            store_url.trim_end_matches('/'),
            api_version.trim_matches('/')
        );
        let products_url = Url::parse(&base)
            .map_err(|e| AppError::Validation(format!("Invalid WooCommerce URL '{}': {}", store_url, e)))?;

        Ok(Self {
            http,
            products_url,
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        })
    }

    pub fn from_config(config: &WooCommerceConfig, http: Client) -> Result<Self> {
        let url = require(&config.url, "woocommerce.url")?;
        let key = require(&config.consumer_key, "woocommerce.consumer_key")?;
        let secret = require(&config.consumer_secret, "woocommerce.consumer_secret")?;
        Self::new(http, url, &config.api_version, key, secret)
    }

    pub async fn list_products(&self) -> Result<Vec<serde_json::Value>> {
        let response = self
            .http
            .get(self.products_url.clone())
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        decode(SERVICE, response).await
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<serde_json::Value> {
        tracing::info!("Creating product in WooCommerce: {}", product.name);

        let response = self
            .http
            .post(self.products_url.clone())
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .json(product)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let created: serde_json::Value = decode(SERVICE, response).await?;

        tracing::debug!(id = ?created.get("id"), sku = %product.sku, "Product created in WooCommerce");
        Ok(created)
    }
}
