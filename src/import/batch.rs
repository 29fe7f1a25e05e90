//! Buffered bulk insertion of new products.

use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::{self, PgPool};

use crate::import::parser::NewProduct;

/// Parallel column vectors for one UNNEST insert.
#[derive(Default)]
struct ProductColumns {
    feed_product_ids: Vec<String>,
    skus: Vec<String>,
    names: Vec<String>,
    qtys: Vec<String>,
    statuses: Vec<String>,
    visibilities: Vec<String>,
    prices: Vec<String>,
    type_ids: Vec<String>,
    descriptions: Vec<String>,
    images: Vec<String>,
    tags: Vec<serde_json::Value>,
    created_ats: Vec<DateTime<Utc>>,
    updated_ats: Vec<DateTime<Utc>>,
}

impl ProductColumns {
    fn from_products(products: &[NewProduct]) -> Self {
        let mut data = ProductColumns::default();

        for product in products {
            data.feed_product_ids.push(product.feed_product_id.clone());
            data.skus.push(product.sku.clone());
            data.names.push(product.name.clone());
            data.qtys.push(product.qty.clone());
            data.statuses.push(product.status.clone());
            data.visibilities.push(product.visibility.clone());
            data.prices.push(product.price.clone());
            data.type_ids.push(product.type_id.clone());
            data.descriptions.push(product.description.clone());
            data.images.push(product.image.clone());
            data.tags.push(serde_json::Value::from(product.tags.clone()));
            data.created_ats.push(product.created_at);
            data.updated_ats.push(product.updated_at);
        }

        data
    }
}

/// Accumulates product candidates and writes them in bounded batches.
///
/// `push` buffers a candidate and flushes automatically once the buffer
/// reaches the configured batch size, so the buffer never grows past it.
/// Each flush is one all-or-nothing insert statement: a rejected batch
/// propagates the error without retrying individual rows.
pub struct BatchWriter {
    pool: PgPool,
    batch_size: usize,
    buffer: Vec<NewProduct>,
    rows_inserted: usize,
    batches_flushed: usize,
}

impl BatchWriter {
    pub fn new(pool: PgPool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            rows_inserted: 0,
            batches_flushed: 0,
        }
    }

    /// Buffer one product, flushing when the buffer reaches the batch size.
    pub async fn push(&mut self, product: NewProduct) -> Result<(), sqlx::Error> {
        self.buffer.push(product);

        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }

        Ok(())
    }

    /// Insert whatever is buffered in a single statement. No-op when empty.
    ///
    /// Empty numeric/boolean fields become NULL via NULLIF; any other value
    /// the database cannot cast fails the whole batch.
    pub async fn flush(&mut self) -> Result<(), sqlx::Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let count = self.buffer.len();
        let data = ProductColumns::from_products(&self.buffer);

        sqlx::query(
            r#"INSERT INTO products (
                feed_product_id, sku, name, qty, status, visibility, price,
                type_id, description, image, tags, created_at, updated_at
               )
               SELECT
                   t.feed_product_id,
                   t.sku,
                   t.name,
                   NULLIF(t.qty, '')::integer,
                   NULLIF(t.status, '')::integer,
                   NULLIF(t.visibility, '')::boolean,
                   NULLIF(t.price, '')::numeric,
                   t.type_id,
                   t.description,
                   t.image,
                   t.tags,
                   t.created_at,
                   t.updated_at
               FROM UNNEST(
                   $1::text[], $2::text[], $3::text[], $4::text[], $5::text[],
                   $6::text[], $7::text[], $8::text[], $9::text[], $10::text[],
                   $11::jsonb[], $12::timestamptz[], $13::timestamptz[]
               ) AS t(feed_product_id, sku, name, qty, status, visibility,
                      price, type_id, description, image, tags,
                      created_at, updated_at)"#,
        )
        .bind(&data.feed_product_ids)
        .bind(&data.skus)
        .bind(&data.names)
        .bind(&data.qtys)
        .bind(&data.statuses)
        .bind(&data.visibilities)
        .bind(&data.prices)
        .bind(&data.type_ids)
        .bind(&data.descriptions)
        .bind(&data.images)
        .bind(&data.tags)
        .bind(&data.created_ats)
        .bind(&data.updated_ats)
        .execute(&self.pool)
        .await?;

        log::trace!("bulk inserted {} products", count);

        self.buffer.clear();
        self.rows_inserted += count;
        self.batches_flushed += 1;

        Ok(())
    }

    /// Total rows written across all flushed batches.
    pub fn rows_inserted(&self) -> usize {
        self.rows_inserted
    }

    /// Number of bulk-insert statements issued so far.
    pub fn batches_flushed(&self) -> usize {
        self.batches_flushed
    }
}
