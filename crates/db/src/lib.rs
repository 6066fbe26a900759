//! Session Store backends.
//!
//! Three implementations of [`touchline_core::store::SessionStore`]:
//!
//! - [`MemorySessionStore`] for tests and throwaway runs.
//! - [`FileSessionStore`], one JSON document per session in a directory.
//! - [`PgSessionStore`], PostgreSQL via sqlx.

pub mod file;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repositories;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
