//! Product feed import pipeline.
//!
//! This module ingests a semicolon-delimited product feed file and inserts
//! previously unknown products into PostgreSQL in bounded batches.
//!
//! # Architecture Overview
//!
//! - **`importer`**: Owns the feed stream and drives the whole run. Opens the
//!   file, loads the dedup snapshot, iterates rows, and forces the final
//!   flush. Fatal failures are logged with context and propagated.
//!
//! - **`parser`**: Turns one raw feed record into a structured product
//!   candidate. Validates the two required fields and splits the tags column;
//!   everything else passes through untouched for the database to cast.
//!
//! - **`dedup`**: A read-only snapshot of every `feed_product_id` already in
//!   storage, loaded in a single query before the loop starts.
//!
//! - **`batch`**: Buffers validated candidates and writes them with one
//!   columnar `INSERT ... SELECT FROM UNNEST(...)` statement per batch.
//!
//! # Data Flow
//!
//! 1. Capture one run timestamp (`created_at`/`updated_at` for every row)
//! 2. Open the feed file; the header line is consumed and discarded
//! 3. Load the dedup snapshot (one query, never refreshed mid-run)
//! 4. Per row: parse/validate -> snapshot lookup -> buffer
//! 5. Buffer reaching the batch size triggers a bulk insert
//! 6. End of stream flushes the remainder
//!
//! # Failure Model
//!
//! A row missing its feed id or name is logged at `warn` and skipped; the run
//! continues. A feed stream error or a rejected batch aborts the run with the
//! error logged at `error` severity. Batches committed before the failure are
//! not rolled back.

pub mod batch;
pub mod dedup;
pub mod importer;
pub mod parser;

pub use dedup::DedupSnapshot;
pub use importer::{DEFAULT_BATCH_SIZE, FeedImporter, ImportConfig, ImportError, ImportStats};
pub use parser::{NewProduct, RowError};
