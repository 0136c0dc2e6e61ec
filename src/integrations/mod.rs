pub mod http;
pub mod keepa;
pub mod sheets;
pub mod sinks;
pub mod traits;
pub mod woocommerce;

pub use keepa::KeepaClient;
pub use sheets::SheetsClient;
pub use traits::{ProductDataProvider, ProductSink, SinkReport, SourceList};
pub use woocommerce::WooCommerceClient;
