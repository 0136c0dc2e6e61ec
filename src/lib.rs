pub mod config;
pub mod integrations;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use pipeline::{Pipeline, PipelineReport, RetryPolicy};
pub use utils::error::{AppError, Result};
