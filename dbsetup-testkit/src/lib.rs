//! Test helpers for DbSetup database-backed tests.
//!
//! Provides tracing setup and a few queries to check what a setup wrote.
//! The fixture schema lives in `migrations/` at the workspace root.

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test: only the first call installs it.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dbsetup_core=debug"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}

/// Number of rows of `table`
pub async fn count_rows(pool: &PgPool, table: &str) -> Result<i64> {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("count")?)
}

/// Text rendering of `column` for every row of `table`, ordered by `order_by`
pub async fn fetch_column(pool: &PgPool, table: &str, column: &str, order_by: &str) -> Result<Vec<Option<String>>> {
    let rows = sqlx::query(&format!(
        "SELECT {}::text AS value FROM {} ORDER BY {}",
        column, table, order_by
    ))
    .fetch_all(pool)
    .await?;

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        values.push(row.try_get("value")?);
    }
    Ok(values)
}
