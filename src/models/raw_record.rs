use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::PriceChannel;
use crate::utils::error::{AppError, Result};

pub const IMAGE_BASE_URL: &str = "https://images-na.ssl-images-amazon.com/images/I/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryNode {
    #[serde(rename = "catId")]
    pub cat_id: i64,
    pub name: String,
}

/// Product object as returned by the Keepa `/product` endpoint.
///
/// Only `asin` is guaranteed by the provider; everything else may be absent
/// or `null` depending on the marketplace and listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub asin: String,
    #[serde(default)]
    pub domain_id: Option<u8>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<Vec<i64>>,
    #[serde(default, rename = "imagesCSV")]
    pub images_csv: Option<String>,
    #[serde(default)]
    pub category_tree: Option<Vec<CategoryNode>>,
    #[serde(default)]
    pub root_category: Option<i64>,
    #[serde(default)]
    pub csv: Option<Vec<Option<Vec<i64>>>>,
}

impl RawRecord {
    pub fn new(asin: impl Into<String>) -> Self {
        Self {
            asin: asin.into(),
            domain_id: None,
            title: None,
            brand: None,
            description: None,
            features: None,
            categories: None,
            images_csv: None,
            category_tree: None,
            root_category: None,
            csv: None,
        }
    }

    /// Decodes the historical series for `channel`.
    ///
    /// Prices are stored in cents; negative entries mark periods without an
    /// offer. Earlier ones are skipped, a trailing one becomes zero so a
    /// listing that is currently unavailable never reports a stale price.
    pub fn price_series(&self, channel: PriceChannel) -> Result<PriceSeries> {
        let Some(raw) = self
            .csv
            .as_ref()
            .and_then(|series| series.get(channel.csv_index()))
            .and_then(|series| series.as_ref())
        else {
            return Ok(PriceSeries::default());
        };

        let stride = channel.stride();
        if raw.len() % stride != 0 {
            return Err(AppError::Schema(format!(
                "{}: price series {} has {} entries, expected a multiple of {}",
                self.asin,
                channel.csv_index(),
                raw.len(),
                stride
            )));
        }

        let points = raw.len() / stride;
        let values = raw
            .chunks_exact(stride)
            .enumerate()
            .filter_map(|(i, point)| {
                let price = point[1];
                if price < 0 {
                    return (i + 1 == points).then_some(Decimal::ZERO);
                }
                let shipping = point.get(2).copied().filter(|s| *s > 0).unwrap_or(0);
                Some(Decimal::new(price + shipping, 2))
            })
            .collect();

        Ok(PriceSeries::new(values))
    }

    /// Name of the category tree entry matching the declared root category.
    pub fn category_label(&self) -> String {
        let Some(root) = self.root_category else {
            return String::new();
        };
        self.category_tree
            .iter()
            .flatten()
            .find(|node| node.cat_id == root)
            .map(|node| node.name.clone())
            .unwrap_or_default()
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.images_csv
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}{}", IMAGE_BASE_URL, name))
            .collect()
    }
}

/// Chronological price observations for one channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries(Vec<Decimal>);

impl PriceSeries {
    pub fn new(values: Vec<Decimal>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Decimal] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent observation, or zero for an empty series.
    pub fn last_value(&self) -> Decimal {
        self.0.last().copied().unwrap_or(Decimal::ZERO)
    }
}
