//! Import orchestration: drives the parse/dedupe/batch loop over a feed file.

use std::fs::File;
use std::path::PathBuf;

use chrono::Utc;
use csv::ReaderBuilder;
use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::import::batch::BatchWriter;
use crate::import::dedup::DedupSnapshot;
use crate::import::parser;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Importer configuration, passed in explicitly rather than resolved from
/// ambient process state.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Path to the semicolon-delimited feed file.
    pub feed_path: PathBuf,
    /// Number of new products per bulk insert. Must be at least 1.
    pub batch_size: usize,
}

impl ImportConfig {
    pub fn new(feed_path: impl Into<PathBuf>) -> Self {
        Self {
            feed_path: feed_path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Fatal failures that abort an import run.
///
/// Row-level validation problems are not represented here: they are recovered
/// locally (logged and counted) and the run continues.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid batch size {0}, must be at least 1")]
    InvalidBatchSize(usize),
    #[error("failed to open feed file {}: {source}", path.display())]
    OpenFeed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("feed read error: {0}")]
    Feed(#[from] csv::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Counters reported by [`FeedImporter::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Data rows read from the feed (header excluded).
    pub rows_read: usize,
    /// New products written to storage.
    pub inserted: usize,
    /// Rows whose feed id was already known at run start.
    pub skipped_existing: usize,
    /// Rows rejected by validation.
    pub skipped_invalid: usize,
    /// Bulk-insert statements issued.
    pub batches_flushed: usize,
}

/// Drives one import run over a product feed file.
///
/// Processes every data row exactly once: by the time `run` returns Ok, all
/// valid new rows are durably stored. Batches committed before a mid-run
/// failure stay committed.
pub struct FeedImporter {
    pool: PgPool,
    config: ImportConfig,
}

impl FeedImporter {
    /// Build an importer, rejecting a zero batch size up front.
    pub fn new(pool: PgPool, config: ImportConfig) -> Result<Self, ImportError> {
        if config.batch_size == 0 {
            return Err(ImportError::InvalidBatchSize(config.batch_size));
        }

        Ok(Self { pool, config })
    }

    /// Run one import pass over the feed file.
    pub async fn run(&self) -> Result<ImportStats, ImportError> {
        match self.import_feed().await {
            Ok(stats) => {
                log::info!(
                    "import complete: {} inserted, {} already known, {} invalid rows, {} batches",
                    stats.inserted,
                    stats.skipped_existing,
                    stats.skipped_invalid,
                    stats.batches_flushed
                );
                Ok(stats)
            }
            Err(err) => {
                log::error!("product import failed: {}", err);
                Err(err)
            }
        }
    }

    async fn import_feed(&self) -> Result<ImportStats, ImportError> {
        // One timestamp for the whole run; every inserted row shares it.
        let imported_at = Utc::now();

        let file = File::open(&self.config.feed_path).map_err(|source| ImportError::OpenFeed {
            path: self.config.feed_path.clone(),
            source,
        })?;

        // Snapshot known ids once, before any row is processed. Rows flushed
        // during this run are invisible to it.
        let snapshot = DedupSnapshot::load(&self.pool).await?;
        log::info!("dedup snapshot loaded: {} known products", snapshot.len());

        // has_headers consumes the first line unconditionally; flexible
        // records let short rows through so the parser sees missing trailing
        // fields as empty.
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut batch = BatchWriter::new(self.pool.clone(), self.config.batch_size);
        let mut stats = ImportStats::default();

        for record in reader.records() {
            let record = record?;
            stats.rows_read += 1;

            let product = match parser::parse_row(&record, imported_at) {
                Ok(product) => product,
                Err(reason) => {
                    log::warn!("skipping feed row {:?}: {}", record, reason);
                    stats.skipped_invalid += 1;
                    continue;
                }
            };

            if snapshot.contains(&product.feed_product_id) {
                stats.skipped_existing += 1;
                continue;
            }

            batch.push(product).await?;
        }

        batch.flush().await?;

        stats.inserted = batch.rows_inserted();
        stats.batches_flushed = batch.batches_flushed();
        Ok(stats)
    }
}
