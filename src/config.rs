use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use url::Url;

use crate::models::{Domain, PriceChannel};
use crate::utils::error::AppError;

/// Keepa rejects product queries above this many identifiers.
pub const KEEPA_MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub keepa: KeepaConfig,
    pub sheets: SheetsConfig,
    pub woocommerce: WooCommerceConfig,
    pub pipeline: PipelineConfig,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout: u64,
    pub user_agent: String,
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub category_id: Option<i64>,
    pub domain: Domain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub base_url: String,
    pub credentials_file: Option<String>,
    pub access_token: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub range: Option<String>,
    pub identifier_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WooCommerceConfig {
    pub url: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub domains: Vec<Domain>,
    pub max_identifiers: Option<usize>,
    pub price_channel: PriceChannel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    #[default]
    Csv,
    Sheets,
    Woocommerce,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub csv_path: String,
    pub sheets_range: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "catalog-relay.log".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: 60,
            user_agent: concat!("catalog-relay/", env!("CARGO_PKG_VERSION")).to_string(),
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for KeepaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.keepa.com".to_string(),
            category_id: None,
            domain: Domain::Us,
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sheets.googleapis.com".to_string(),
            credentials_file: None,
            access_token: None,
            spreadsheet_id: None,
            range: None,
            identifier_column: "ASIN".to_string(),
        }
    }
}

impl Default for WooCommerceConfig {
    fn default() -> Self {
        Self {
            url: None,
            consumer_key: None,
            consumer_secret: None,
            api_version: "wc/v3".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            domains: vec![Domain::Us, Domain::Mx],
            max_identifiers: None,
            price_channel: PriceChannel::BuyBoxShipping,
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Csv,
            csv_path: "products.csv".to_string(),
            sheets_range: None,
        }
    }
}

/// Returns the configured secret or a `ConfigMissing` error naming its key.
pub fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::config_missing(key))
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config")
    }

    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Built-in defaults cover everything except secrets
            .add_source(File::from(dir.join("default")).required(false))
            // Add environment-specific config
            .add_source(File::from(dir.join(&run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::from(dir.join("local")).required(false))
            // Add environment variables like RELAY_KEEPA__API_KEY
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("pipeline.domains")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Fall back to the plain variable names used by existing .env files
        config.apply_fallbacks(|name| env::var(name).ok());

        config.validate()?;
        Ok(config)
    }

    /// Fills unset secrets from `lookup`, keyed by the plain variable names.
    pub fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut Option<String>, name: &str| {
            if slot.as_deref().is_none_or(|v| v.trim().is_empty()) {
                *slot = lookup(name).filter(|v| !v.trim().is_empty());
            }
        };

        fill(&mut self.keepa.api_key, "KEEPA_API_KEY");
        fill(&mut self.sheets.credentials_file, "GOOGLE_SHEETS_CREDENTIALS_FILE");
        fill(&mut self.sheets.spreadsheet_id, "GOOGLE_SHEETS_SPREADSHEET_ID");
        fill(&mut self.sheets.range, "GOOGLE_SHEETS_RANGE_NAME");
        fill(&mut self.woocommerce.url, "WOOCOMMERCE_URL");
        fill(&mut self.woocommerce.consumer_key, "WOOCOMMERCE_CONSUMER_KEY");
        fill(&mut self.woocommerce.consumer_secret, "WOOCOMMERCE_CONSUMER_SECRET");

        if self.keepa.category_id.is_none() {
            self.keepa.category_id = lookup("KEEPA_CATEGORY_ID").and_then(|v| v.trim().parse().ok());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate logging configuration
        if self
            .logging
            .level
            .parse::<tracing_subscriber::filter::LevelFilter>()
            .is_err()
        {
            return Err(ConfigError::Message(format!(
                "Invalid logging level: {}",
                self.logging.level
            )));
        }

        // Validate HTTP configuration
        if self.http.request_timeout == 0 {
            return Err(ConfigError::Message("HTTP request_timeout must be greater than 0".into()));
        }

        // Validate endpoints
        if Url::parse(&self.keepa.base_url).is_err() {
            return Err(ConfigError::Message("Invalid Keepa base URL format".into()));
        }

        if Url::parse(&self.sheets.base_url).is_err() {
            return Err(ConfigError::Message("Invalid Sheets base URL format".into()));
        }

        if let Some(url) = &self.woocommerce.url {
            if !url.is_empty() && Url::parse(url).is_err() {
                return Err(ConfigError::Message("Invalid WooCommerce URL format".into()));
            }
        }

        if self.sheets.identifier_column.is_empty() {
            return Err(ConfigError::Message("Sheets identifier_column must not be empty".into()));
        }

        // Validate pipeline configuration
        if self.pipeline.batch_size == 0 {
            return Err(ConfigError::Message("Pipeline batch_size must be greater than 0".into()));
        }

        if self.pipeline.batch_size > KEEPA_MAX_BATCH {
            return Err(ConfigError::Message(format!(
                "Pipeline batch_size cannot exceed {}",
                KEEPA_MAX_BATCH
            )));
        }

        if self.pipeline.domains.is_empty() {
            return Err(ConfigError::Message("Pipeline domains must not be empty".into()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.pipeline.domains.iter().find(|d| !seen.insert(**d)) {
            return Err(ConfigError::Message(format!("Duplicate pipeline domain: {}", dup)));
        }

        if self.pipeline.max_identifiers == Some(0) {
            return Err(ConfigError::Message("Pipeline max_identifiers must be greater than 0".into()));
        }

        // Validate sink configuration
        if self.sink.kind == SinkKind::Csv && self.sink.csv_path.trim().is_empty() {
            return Err(ConfigError::Message("Sink csv_path must not be empty".into()));
        }

        Ok(())
    }
}
