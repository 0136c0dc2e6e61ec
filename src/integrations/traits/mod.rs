pub mod provider;
pub mod sink;
pub mod source_list;

pub use provider::ProductDataProvider;
pub use sink::{ProductSink, SinkReport};
pub use source_list::SourceList;
