use rocket::serde::json::Json;
use rocket_db_pools::{Connection, sqlx};
use rocket_okapi::openapi;

use crate::db::CatalogDb;
use crate::error::ApiError;
use crate::models::{PaginatedResponse, Product};
use crate::routes::params::ProductListParams;

/// List catalog products filtered by status and visibility.
#[openapi(tag = "Products")]
#[get("/products?<params..>")]
pub async fn list_products(
    mut db: Connection<CatalogDb>,
    params: ProductListParams,
) -> Result<Json<PaginatedResponse<Product>>, ApiError> {
    if !(0..=1).contains(&params.status) {
        return Err(ApiError::BadRequest(format!(
            "invalid status '{}', expected 0 or 1",
            params.status
        )));
    }

    let page = params.page();
    let page_size = params.page_size();

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = $1 AND visibility = $2")
            .bind(params.status)
            .bind(params.visibility)
            .fetch_one(&mut **db)
            .await?;

    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, feed_product_id, sku, name, qty, status, visibility,
               CAST(price AS DOUBLE PRECISION) AS price,
               type_id, description, image,
               ARRAY(SELECT jsonb_array_elements_text(tags)) AS tags,
               created_at, updated_at
        FROM products
        WHERE status = $1 AND visibility = $2
        ORDER BY id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(params.status)
    .bind(params.visibility)
    .bind(page_size)
    .bind(params.offset())
    .fetch_all(&mut **db)
    .await?;

    Ok(Json(PaginatedResponse {
        data: products,
        page,
        page_size,
        total,
    }))
}
