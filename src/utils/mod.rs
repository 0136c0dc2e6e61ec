pub mod chunks;
pub mod error;

pub use chunks::batches;
pub use error::{AppError, Result};
