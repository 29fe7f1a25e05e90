use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Catalog product as persisted in the `products` table.
///
/// `price` is stored as NUMERIC and selected with a CAST to double precision;
/// `tags` is stored as a JSONB array and selected as text[]. Descriptive
/// fields arrive from the feed verbatim, so most of them are nullable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct Product {
    pub id: i32,
    pub feed_product_id: String,
    pub sku: Option<String>,
    pub name: String,
    pub qty: Option<i32>,
    pub status: Option<i32>,
    pub visibility: Option<bool>,
    pub price: Option<f64>,
    pub type_id: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Envelope for paginated list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
