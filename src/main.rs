use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use catalog_relay::config::{AppConfig, LoggingConfig, SinkKind};
use catalog_relay::integrations::http::build_client;
use catalog_relay::integrations::sinks::build_sink;
use catalog_relay::integrations::{KeepaClient, SheetsClient};
use catalog_relay::models::Domain;
use catalog_relay::{AppError, Pipeline, RetryPolicy};

#[derive(Parser)]
#[command(name = "catalog-relay", version, about = "Relay Keepa product data into spreadsheets, CSV files and storefronts")]
struct Cli {
    /// Directory holding default/<RUN_MODE>/local config files
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the products listed in the spreadsheet's identifier column
    Export {
        /// Header of the column holding the ASINs (defaults to sheets.identifier_column)
        #[arg(long)]
        column: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Export the best sellers of every subcategory of a category
    BestSellers {
        #[arg(long)]
        category: Option<i64>,

        #[arg(long)]
        domain: Option<Domain>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long, value_enum)]
    sink: Option<SinkKind>,

    /// CSV output path
    #[arg(long)]
    output: Option<String>,

    /// Stop after this many identifiers
    #[arg(long)]
    limit: Option<usize>,
}

impl OutputArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(kind) = self.sink {
            config.sink.kind = kind;
        }
        if let Some(path) = &self.output {
            config.sink.csv_path = path.clone();
        }
        if self.limit.is_some() {
            config.pipeline.max_identifiers = self.limit;
        }
    }
}

fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("warn,catalog_relay={}", config.level)))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config_dir {
        Some(dir) => AppConfig::load_from(dir)?,
        None => AppConfig::load()?,
    };

    let output = match &cli.command {
        Command::Export { output, .. } | Command::BestSellers { output, .. } => output,
    };
    output.apply(&mut config);
    config.validate()?;

    // Held until exit so buffered file logs are flushed
    let _guard = init_tracing(&config.logging)?;
    info!("Starting Catalog Relay...");

    let http = build_client(&config.http)?;
    let provider = KeepaClient::from_config(&config.keepa, http.clone())?;
    let sink = build_sink(config.sink.kind, &config, &http)?;
    if !sink.is_idempotent() {
        warn!("{} sink creates new records on every run", sink.name());
    }

    let pipeline = Pipeline::new(
        Box::new(provider),
        config.pipeline.clone(),
        RetryPolicy::from(&config.http),
    );

    let report = match cli.command {
        Command::Export { column, .. } => {
            let source = SheetsClient::from_config(&config.sheets, http.clone())?;
            let column = column.unwrap_or_else(|| config.sheets.identifier_column.clone());
            pipeline.export_from_source(&source, &column, sink.as_ref()).await?
        }
        Command::BestSellers { category, domain, .. } => {
            let category = category
                .or(config.keepa.category_id)
                .ok_or_else(|| AppError::config_missing("keepa.category_id"))?;
            let domain = domain.unwrap_or(config.keepa.domain);
            pipeline.export_best_sellers(category, domain, sink.as_ref()).await?
        }
    };

    info!(
        "Finished: {} identifiers in {} batches, {} rows written",
        report.identifiers, report.batches, report.sink.rows_written
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
