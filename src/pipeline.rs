use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::config::{HttpConfig, PipelineConfig};
use crate::integrations::traits::{ProductDataProvider, ProductSink, SinkReport, SourceList};
use crate::models::{CanonicalProduct, Domain, MergedProduct, ProductTable, RawRecord};
use crate::normalizer::Normalizer;
use crate::utils::batches;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadIdentifiers,
    Chunking,
    FetchingBatch(Domain),
    Normalizing,
    Accumulating,
    Writing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ReadIdentifiers => f.write_str("read-identifiers"),
            Stage::Chunking => f.write_str("chunking"),
            Stage::FetchingBatch(domain) => write!(f, "fetching-batch({})", domain),
            Stage::Normalizing => f.write_str("normalizing"),
            Stage::Accumulating => f.write_str("accumulating"),
            Stage::Writing => f.write_str("writing"),
            Stage::Done => f.write_str("done"),
        }
    }
}

/// Backoff applied to transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            delay_ms: 0,
        }
    }

    /// Delays of `delay_ms`, then doubling, capped at 30 seconds, with jitter.
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor((self.delay_ms / 2).max(1))
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.attempts)
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            delay_ms: config.retry_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub identifiers: usize,
    pub batches: usize,
    pub rows: usize,
    pub sink: SinkReport,
}

/// Trims identifiers, drops blanks and repeats (first occurrence wins), then applies `limit`.
pub fn prepare_identifiers(raw: Vec<String>, limit: Option<usize>) -> Vec<String> {
    let total = raw.len();
    let mut seen = HashSet::new();
    let mut identifiers: Vec<String> = raw
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if identifiers.len() < total {
        tracing::debug!(
            "Dropped {} blank or repeated identifiers",
            total - identifiers.len()
        );
    }

    if let Some(limit) = limit {
        if identifiers.len() > limit {
            tracing::info!("Limiting run to the first {} of {} identifiers", limit, identifiers.len());
            identifiers.truncate(limit);
        }
    }
    identifiers
}

/// Sequential read → chunk → fetch → normalize → merge → write driver.
///
/// Batches run one at a time in identifier order, and each batch fetches the
/// configured domains in order. Rows are held in memory until the single sink
/// write at the end; any error before then aborts the run without output.
pub struct Pipeline {
    provider: Box<dyn ProductDataProvider>,
    normalizer: Normalizer,
    settings: PipelineConfig,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(provider: Box<dyn ProductDataProvider>, settings: PipelineConfig, retry: RetryPolicy) -> Self {
        Self {
            provider,
            normalizer: Normalizer::new(settings.price_channel),
            settings,
            retry,
        }
    }

    pub fn domains(&self) -> &[Domain] {
        &self.settings.domains
    }

    /// Exports the products listed in `column` of the source list.
    pub async fn export_from_source(
        &self,
        source: &dyn SourceList,
        column: &str,
        sink: &dyn ProductSink,
    ) -> Result<PipelineReport> {
        self.enter(Stage::ReadIdentifiers);
        tracing::info!("Reading identifiers from column '{}' of {}", column, source.name());
        let raw = source.read_column(column).await?;
        let identifiers = prepare_identifiers(raw, self.settings.max_identifiers);
        tracing::info!("Read {} identifiers", identifiers.len());

        self.export(identifiers, sink).await
    }

    /// Exports the best sellers of every subcategory of `category_id`.
    pub async fn export_best_sellers(
        &self,
        category_id: i64,
        domain: Domain,
        sink: &dyn ProductSink,
    ) -> Result<PipelineReport> {
        self.enter(Stage::ReadIdentifiers);
        let subcategories = self.provider.resolve_subcategories(category_id, domain).await?;

        let mut raw = Vec::new();
        for subcategory in subcategories {
            let best_sellers = self.provider.best_selling_identifiers(subcategory, domain).await?;
            raw.extend(best_sellers);
        }
        tracing::info!("Collected {} best-selling ASINs", raw.len());

        let identifiers = prepare_identifiers(raw, self.settings.max_identifiers);
        self.export(identifiers, sink).await
    }

    async fn export(&self, identifiers: Vec<String>, sink: &dyn ProductSink) -> Result<PipelineReport> {
        let rows = self.collect(&identifiers).await?;
        let batches = identifiers.len().div_ceil(self.settings.batch_size);

        self.enter(Stage::Writing);
        let table = ProductTable::new(self.settings.domains.clone(), rows);
        let report = sink.write(&table).await?;

        self.enter(Stage::Done);
        tracing::info!(
            "Exported {} products to {} ({} rows written)",
            table.len(),
            sink.name(),
            report.rows_written
        );

        Ok(PipelineReport {
            identifiers: identifiers.len(),
            batches,
            rows: table.len(),
            sink: report,
        })
    }

    /// Fetches, normalizes and merges every identifier, preserving input order.
    pub async fn collect(&self, identifiers: &[String]) -> Result<Vec<MergedProduct>> {
        self.enter(Stage::Chunking);
        let chunks = batches(identifiers, self.settings.batch_size)?;
        let mut accumulator = Vec::with_capacity(identifiers.len());

        for (index, batch) in chunks.enumerate() {
            let mut listings: Vec<(Domain, HashMap<String, CanonicalProduct>)> =
                Vec::with_capacity(self.settings.domains.len());

            for &domain in &self.settings.domains {
                self.enter(Stage::FetchingBatch(domain));
                let records = self.fetch_with_retry(batch, domain).await?;

                self.enter(Stage::Normalizing);
                listings.push((domain, self.normalize_all(&records)?));
            }

            self.enter(Stage::Accumulating);
            for asin in batch {
                let merged = listings
                    .iter_mut()
                    .map(|(domain, by_asin)| {
                        let product = by_asin.remove(asin);
                        if product.is_none() {
                            tracing::warn!("No {} record returned for {}", domain, asin);
                        }
                        (*domain, product)
                    })
                    .collect();
                accumulator.push(MergedProduct::new(asin.clone(), merged));
            }

            tracing::info!("Batch {} processed ({} ASINs)", index + 1, batch.len());
        }

        Ok(accumulator)
    }

    fn normalize_all(&self, records: &[RawRecord]) -> Result<HashMap<String, CanonicalProduct>> {
        records
            .iter()
            .map(|record| {
                let product = self.normalizer.normalize(record)?;
                Ok((product.asin.clone(), product))
            })
            .collect()
    }

    async fn fetch_with_retry(&self, batch: &[String], domain: Domain) -> Result<Vec<RawRecord>> {
        RetryIf::spawn(
            self.retry.strategy(),
            || self.provider.fetch_records(batch, domain),
            |err: &AppError| {
                let transient = err.is_transient();
                if transient {
                    tracing::warn!("Fetching {} ASINs in {} failed: {}", batch.len(), domain, err);
                }
                transient
            },
        )
        .await
    }

    fn enter(&self, stage: Stage) {
        tracing::debug!(%stage, "Pipeline stage");
    }
}
