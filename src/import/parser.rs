//! Feed row parsing and validation.
//!
//! One feed record maps positionally onto a product candidate. Only the feed
//! id and name are validated here; numeric and boolean columns are carried as
//! raw text and cast by the database at insert time, so a malformed value
//! fails its batch rather than an individual row.

use chrono::{DateTime, Utc};
use csv::StringRecord;
use thiserror::Error;

// Column positions in the semicolon-delimited feed.
const COL_FEED_PRODUCT_ID: usize = 0;
const COL_SKU: usize = 1;
const COL_NAME: usize = 2;
const COL_QTY: usize = 3;
const COL_STATUS: usize = 4;
const COL_VISIBILITY: usize = 5;
const COL_PRICE: usize = 6;
const COL_TYPE_ID: usize = 7;
const COL_DESCRIPTION: usize = 8;
const COL_IMAGE: usize = 9;
const COL_TAGS: usize = 10;

/// Product candidate assembled from one feed row.
///
/// Scalar fields hold the feed text verbatim. `created_at` and `updated_at`
/// carry the run timestamp, identical for every row of the same import.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub feed_product_id: String,
    pub sku: String,
    pub name: String,
    pub qty: String,
    pub status: String,
    pub visibility: String,
    pub price: String,
    pub type_id: String,
    pub description: String,
    pub image: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reason a feed row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing feed_product_id")]
    MissingFeedProductId,
    #[error("missing name")]
    MissingName,
}

/// Parse one feed record into a product candidate.
///
/// Pure function of the record and the run timestamp. Fields past the end of
/// a short record read as empty strings, which the required-field checks then
/// catch for positions 0 and 2.
pub fn parse_row(
    record: &StringRecord,
    imported_at: DateTime<Utc>,
) -> Result<NewProduct, RowError> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    if field(COL_FEED_PRODUCT_ID).trim().is_empty() {
        return Err(RowError::MissingFeedProductId);
    }
    if field(COL_NAME).trim().is_empty() {
        return Err(RowError::MissingName);
    }

    Ok(NewProduct {
        feed_product_id: field(COL_FEED_PRODUCT_ID).to_string(),
        sku: field(COL_SKU).to_string(),
        name: field(COL_NAME).to_string(),
        qty: field(COL_QTY).to_string(),
        status: field(COL_STATUS).to_string(),
        visibility: field(COL_VISIBILITY).to_string(),
        price: field(COL_PRICE).to_string(),
        type_id: field(COL_TYPE_ID).to_string(),
        description: field(COL_DESCRIPTION).to_string(),
        image: field(COL_IMAGE).to_string(),
        tags: split_tags(field(COL_TAGS)),
        created_at: imported_at,
        updated_at: imported_at,
    })
}

/// Split the comma-separated tags column into trimmed tokens, keeping order.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(|tag| tag.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn full_row() -> StringRecord {
        record(&[
            "1001",
            "SKU-1001",
            "Widget",
            "5",
            "1",
            "1",
            "9.99",
            "simple",
            "A widget",
            "widget.jpg",
            "tools, garden ,home",
        ])
    }

    #[test]
    fn maps_fields_positionally() {
        let now = Utc::now();
        let product = parse_row(&full_row(), now).unwrap();

        assert_eq!(product.feed_product_id, "1001");
        assert_eq!(product.sku, "SKU-1001");
        assert_eq!(product.name, "Widget");
        assert_eq!(product.qty, "5");
        assert_eq!(product.status, "1");
        assert_eq!(product.visibility, "1");
        assert_eq!(product.price, "9.99");
        assert_eq!(product.type_id, "simple");
        assert_eq!(product.description, "A widget");
        assert_eq!(product.image, "widget.jpg");
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
    }

    #[test]
    fn splits_and_trims_tags_preserving_order() {
        let product = parse_row(&full_row(), Utc::now()).unwrap();
        assert_eq!(product.tags, vec!["tools", "garden", "home"]);
    }

    #[test]
    fn rejects_empty_feed_product_id() {
        let row = record(&["  ", "SKU", "Widget"]);
        assert_eq!(
            parse_row(&row, Utc::now()),
            Err(RowError::MissingFeedProductId)
        );
    }

    #[test]
    fn rejects_empty_name() {
        let row = record(&["1001", "SKU", "   "]);
        assert_eq!(parse_row(&row, Utc::now()), Err(RowError::MissingName));
    }

    #[test]
    fn short_record_reads_missing_fields_as_empty() {
        let row = record(&["1001", "SKU", "Widget"]);
        let product = parse_row(&row, Utc::now()).unwrap();

        assert_eq!(product.qty, "");
        assert_eq!(product.price, "");
        assert_eq!(product.image, "");
        // An absent tags column splits into a single empty token, matching
        // how the feed's source system serialized it.
        assert_eq!(product.tags, vec![""]);
    }

    #[test]
    fn short_record_missing_name_is_rejected() {
        let row = record(&["1001", "SKU"]);
        assert_eq!(parse_row(&row, Utc::now()), Err(RowError::MissingName));
    }
}
