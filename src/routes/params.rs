//! Query parameter helpers for the catalog API.
//!
//! Strongly-typed parsing for URL query strings following Rocket's `FromForm`
//! conventions, deriving `JsonSchema` so the generated OpenAPI documentation
//! reflects the available parameters and their defaults.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_status() -> i32 {
    1
}

const fn default_visibility() -> bool {
    true
}

const fn default_page() -> i64 {
    1
}

const fn default_page_size() -> i64 {
    10
}

const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters accepted by the product list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, rocket::form::FromForm, JsonSchema)]
pub struct ProductListParams {
    /// Product status filter: 0 or 1 (defaults to 1, enabled).
    #[field(default = 1)]
    #[serde(default = "default_status")]
    pub status: i32,
    /// Storefront visibility filter (defaults to true).
    #[field(default = true)]
    #[serde(default = "default_visibility")]
    pub visibility: bool,
    /// One-based page index (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page (clamped between 1 and 100, default 10).
    #[field(default = 10)]
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Default for ProductListParams {
    fn default() -> Self {
        Self {
            status: default_status(),
            visibility: default_visibility(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl ProductListParams {
    /// Normalized 1-based page index.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Normalized page size capped at [`MAX_PAGE_SIZE`].
    pub fn page_size(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset corresponding to the normalized page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::form::Form;

    #[test]
    fn parses_product_list_query() {
        let parsed: ProductListParams =
            Form::parse("status=0&visibility=false&page=3&page_size=5").unwrap();
        assert_eq!(parsed.status, 0);
        assert!(!parsed.visibility);
        assert_eq!(parsed.page(), 3);
        assert_eq!(parsed.page_size(), 5);
        assert_eq!(parsed.offset(), 10);
    }

    #[test]
    fn applies_defaults_to_empty_query() {
        let parsed: ProductListParams = Form::parse("").unwrap();
        assert_eq!(parsed.status, 1);
        assert!(parsed.visibility);
        assert_eq!(parsed.page(), 1);
        assert_eq!(parsed.page_size(), 10);
        assert_eq!(parsed.offset(), 0);
    }

    #[test]
    fn clamps_page_and_page_size() {
        let parsed: ProductListParams = Form::parse("page=0&page_size=1000").unwrap();
        assert_eq!(parsed.page(), 1);
        assert_eq!(parsed.page_size(), MAX_PAGE_SIZE);

        let parsed_small: ProductListParams = Form::parse("page_size=0").unwrap();
        assert_eq!(parsed_small.page_size(), 1);
    }
}
