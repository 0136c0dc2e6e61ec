use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Transport error: {service}: {message}")]
    Transport { service: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn config_missing(key: impl Into<String>) -> Self {
        AppError::ConfigMissing { key: key.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound { resource: resource.into() }
    }

    pub fn transport(service: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Transport {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Errors worth retrying: network failures, timeouts and rate limits.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport { .. })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let service = err
            .url()
            .and_then(|url| url.host_str())
            .unwrap_or("http")
            .to_string();
        AppError::Transport {
            service,
            message: err.to_string(),
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
