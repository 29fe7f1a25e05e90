use rocket_db_pools::sqlx::{self, PgPool};
use rocket_db_pools::Database;

#[derive(Database)]
#[database("catalog_db")]
pub struct CatalogDb(sqlx::PgPool);

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Bring the database schema up to date before serving traffic.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("checking database migration state");

    // `run` ensures the migrations table exists, verifies checksums, and
    // applies any pending migrations.
    MIGRATOR.run(pool).await?;

    log::info!("database migrations up to date");
    Ok(())
}
