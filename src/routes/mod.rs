//! HTTP route handlers for the catalog API.
//!
//! Each submodule covers a logical area of the API and exposes typed Rocket
//! handlers annotated with `#[openapi]` so `rocket_okapi` can derive an
//! OpenAPI document automatically.

pub mod health;
pub mod params;
pub mod products;
