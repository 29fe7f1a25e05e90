use std::path::PathBuf;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use catalog_server::import::{FeedImporter, ImportConfig};

#[derive(Parser, Debug)]
#[command(
    name = "import_products",
    about = "Import products from a semicolon-delimited feed file"
)]
struct Args {
    /// Path to the product feed file.
    #[arg(long, default_value = "products.csv")]
    feed: PathBuf,

    /// Number of new products inserted per bulk write.
    #[arg(long, short = 'b', default_value_t = 100)]
    batch: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let config = ImportConfig::new(args.feed).with_batch_size(args.batch);
    let importer = FeedImporter::new(pool, config)?;
    let stats = importer.run().await?;

    println!(
        "Imported {} products ({} already known, {} invalid rows, {} batches)",
        stats.inserted, stats.skipped_existing, stats.skipped_invalid, stats.batches_flushed
    );
    Ok(())
}
