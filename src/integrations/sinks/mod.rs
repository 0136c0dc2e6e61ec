// Sink implementations
pub mod csv_file;
pub mod spreadsheet;
pub mod storefront;

pub use csv_file::CsvSink;
pub use spreadsheet::SpreadsheetSink;
pub use storefront::StorefrontSink;

use reqwest::Client;

use crate::config::{AppConfig, SinkKind};
use crate::integrations::sheets::SheetsClient;
use crate::integrations::traits::ProductSink;
use crate::integrations::woocommerce::WooCommerceClient;
use crate::utils::error::Result;

pub type ProductSinkBox = Box<dyn ProductSink>;

/// Builds the sink selected by `kind`, checking only the settings that sink needs.
pub fn build_sink(kind: SinkKind, config: &AppConfig, http: &Client) -> Result<ProductSinkBox> {
    let sink: ProductSinkBox = match kind {
        SinkKind::Csv => Box::new(CsvSink::new(&config.sink.csv_path)),
        SinkKind::Sheets => {
            let client = SheetsClient::from_config(&config.sheets, http.clone())?;
            match &config.sink.sheets_range {
                // A dedicated output range gets its header rewritten to match the domains
                Some(range) if !range.trim().is_empty() => {
                    Box::new(SpreadsheetSink::with_header(Box::new(client.with_range(range.clone()))))
                }
                _ => Box::new(SpreadsheetSink::new(Box::new(client))),
            }
        }
        SinkKind::Woocommerce => {
            let client = WooCommerceClient::from_config(&config.woocommerce, http.clone())?;
            Box::new(StorefrontSink::new(client))
        }
    };

    tracing::debug!("Using sink: {} ({})", sink.name(), sink.description());
    Ok(sink)
}
