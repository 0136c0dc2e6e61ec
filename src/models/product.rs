use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Domain;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalProduct {
    pub asin: String,
    pub title: Option<String>,
    pub price: Decimal,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub categories: Vec<i64>,
    pub images: Vec<String>,
    pub category_label: String,
}

/// One identifier with its normalized product per configured domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedProduct {
    pub asin: String,
    pub listings: Vec<(Domain, Option<CanonicalProduct>)>,
}

impl MergedProduct {
    pub fn new(asin: String, listings: Vec<(Domain, Option<CanonicalProduct>)>) -> Self {
        Self { asin, listings }
    }

    pub fn listing(&self, domain: Domain) -> Option<&CanonicalProduct> {
        self.listings
            .iter()
            .find(|(d, _)| *d == domain)
            .and_then(|(_, product)| product.as_ref())
    }

    /// First listing, in domain order, that the provider returned data for.
    pub fn primary(&self) -> Option<(Domain, &CanonicalProduct)> {
        self.listings
            .iter()
            .find_map(|(domain, product)| product.as_ref().map(|p| (*domain, p)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Title,
    Brand,
    Category,
    Description,
    Price,
}

impl Column {
    const ALL: [Column; 5] = [
        Column::Title,
        Column::Brand,
        Column::Category,
        Column::Description,
        Column::Price,
    ];

    fn label(self) -> &'static str {
        match self {
            Column::Title => "Title",
            Column::Brand => "Brand",
            Column::Category => "Category",
            Column::Description => "Description",
            Column::Price => "Price",
        }
    }

    fn cell(self, product: &CanonicalProduct) -> String {
        match self {
            Column::Title => product.title.clone().unwrap_or_default(),
            Column::Brand => product.brand.clone().unwrap_or_default(),
            Column::Category => product.category_label.clone(),
            Column::Description => product.description.clone().unwrap_or_default(),
            Column::Price => product.price.to_string(),
        }
    }
}

/// Merged rows plus the domain layout they were fetched with.
///
/// The tabular shape is `ASIN` followed by each field once per domain,
/// e.g. `Title US`, `Title MX`, `Brand US`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTable {
    pub domains: Vec<Domain>,
    pub rows: Vec<MergedProduct>,
}

impl ProductTable {
    pub fn new(domains: Vec<Domain>, rows: Vec<MergedProduct>) -> Self {
        Self { domains, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["ASIN".to_string()];
        for column in Column::ALL {
            for domain in &self.domains {
                header.push(format!("{} {}", column.label(), domain));
            }
        }
        header
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }

    fn record(&self, row: &MergedProduct) -> Vec<String> {
        let mut record = vec![row.asin.clone()];
        for column in Column::ALL {
            for domain in &self.domains {
                record.push(row.listing(*domain).map(|p| column.cell(p)).unwrap_or_default());
            }
        }
        record
    }
}
