//! PostgreSQL destinations.
//!
//! This module provides:
//! - `PgPoolDestination`, acquiring connections from a `PgPool`
//! - `PgUrlDestination`, opening a fresh connection from a URL for each launch
//! - `PgSession`, adapting a PostgreSQL pool to [`Connection`]
//!
//! Transactions are sqlx [`Transaction`]s: a session dropped before commit,
//! e.g. when a launch is cancelled, rolls back before its connection is reused.
//!
//! Statements use dynamic queries (sqlx::query) since fixture SQL is only
//! known at runtime. Parameter metadata is read from
//! `information_schema.columns`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgQueryResult, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Executor, Row, Transaction};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bind::{ParameterMetadata, SqlType};
use crate::config::DbSetupConfig;
use crate::destination::{BoundParameter, Connection, Destination, IntoDestination};
use crate::error::{DbSetupError, DbSetupResult};
use crate::value::Value;

// =============================================================================
// Destinations
// =============================================================================

/// Destination acquiring connections from a PostgreSQL pool.
///
/// Share one `Arc<PgPoolDestination>` between setups so that a
/// [`DbSetupTracker`](crate::DbSetupTracker) sees them as identical.
#[derive(Debug, Clone)]
pub struct PgPoolDestination {
    pool: PgPool,
}

impl PgPoolDestination {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pool from configuration
    pub async fn connect(config: &DbSetupConfig) -> DbSetupResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;

        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Destination for PgPoolDestination {
    async fn connection(&self) -> DbSetupResult<Box<dyn Connection>> {
        Ok(Box::new(PgSession::new(self.pool.clone())))
    }
}

impl IntoDestination for PgPool {
    fn into_destination(self) -> Arc<dyn Destination> {
        Arc::new(PgPoolDestination::new(self))
    }
}

impl IntoDestination for &PgPool {
    fn into_destination(self) -> Arc<dyn Destination> {
        Arc::new(PgPoolDestination::new(self.clone()))
    }
}

/// Destination opening a new connection from a URL for each launch
#[derive(Clone)]
pub struct PgUrlDestination {
    url: String,
    user: Option<String>,
    password: Option<String>,
}

impl PgUrlDestination {
    /// Connect with the credentials of the URL, if any
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
        }
    }

    /// Connect with the given credentials, overriding those of the URL
    pub fn with_credentials(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            user: Some(user.into()),
            password: Some(password.into()),
        }
    }

    /// The database URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn connect_options(&self) -> DbSetupResult<PgConnectOptions> {
        let mut options: PgConnectOptions = self.url.parse()?;
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }
}

impl fmt::Debug for PgUrlDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgUrlDestination")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl Destination for PgUrlDestination {
    async fn connection(&self) -> DbSetupResult<Box<dyn Connection>> {
        // a single-connection pool, dropped with the session
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(self.connect_options()?)
            .await?;
        debug!(user = ?self.user, "Opened PostgreSQL connection");
        Ok(Box::new(PgSession::new(pool)))
    }
}

// =============================================================================
// Session
// =============================================================================

/// A PostgreSQL session used by operations.
///
/// Statements run in the open transaction, or directly on the pool outside
/// of one. Placeholders are numbered (`$1`, `$2`, ...). NULLs are bound with
/// the column type when metadata knows it, and text is parsed for UUID, JSON
/// and BOOLEAN columns, which PostgreSQL does not cast from text implicitly.
pub struct PgSession {
    pool: PgPool,
    transaction: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    /// Create a session on `pool`, without transaction
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transaction: None,
        }
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    async fn run(&mut self, query: PgQuery<'_>) -> DbSetupResult<PgQueryResult> {
        let result = match self.transaction.as_mut() {
            Some(tx) => query.execute(&mut **tx).await?,
            None => query.execute(&self.pool).await?,
        };
        Ok(result)
    }

    async fn fetch(&mut self, query: PgQuery<'_>) -> DbSetupResult<Vec<PgRow>> {
        let rows = match self.transaction.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }
}

impl fmt::Debug for PgSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSession")
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

#[async_trait]
impl Connection for PgSession {
    async fn begin(&mut self) -> DbSetupResult<()> {
        if self.transaction.is_some() {
            return Err(DbSetupError::invalid_state("a transaction is already open"));
        }
        self.transaction = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn commit(&mut self) -> DbSetupResult<()> {
        match self.transaction.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(DbSetupError::invalid_state("no transaction to commit")),
        }
    }

    async fn rollback(&mut self) -> DbSetupResult<()> {
        // a transaction consumed by a failed commit rolls back when dropped
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> DbSetupResult<u64> {
        // simple query protocol: the statement may hold several commands
        let result = match self.transaction.as_mut() {
            Some(tx) => (&mut **tx).execute(sql).await?,
            None => (&self.pool).execute(sql).await?,
        };
        Ok(result.rows_affected())
    }

    async fn execute_prepared(&mut self, sql: &str, params: &[BoundParameter]) -> DbSetupResult<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_parameter(query, param)?;
        }
        let result = self.run(query).await?;
        Ok(result.rows_affected())
    }

    async fn parameter_metadata(
        &mut self,
        table: &str,
        columns: &[String],
    ) -> DbSetupResult<ParameterMetadata> {
        let (schema, table_name) = split_table_name(table);

        // unqualified tables resolve through the search path, first match wins
        let query = sqlx::query(
            r#"
            SELECT column_name::text AS column_name,
                   data_type::text AS data_type,
                   table_schema::text AS table_schema
            FROM information_schema.columns
            WHERE table_name = $2
              AND (table_schema = $1
                   OR ($1::text IS NULL AND table_schema = ANY(current_schemas(false))))
            ORDER BY array_position(current_schemas(false), table_schema::name), ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table_name);
        let rows = self.fetch(query).await?;

        let Some(first) = rows.first() else {
            return Err(DbSetupError::invalid_argument(format!(
                "no column found for table {}",
                table
            )));
        };
        let resolved_schema: String = first.try_get("table_schema")?;

        let mut column_types = Vec::with_capacity(rows.len());
        for row in &rows {
            let row_schema: String = row.try_get("table_schema")?;
            if row_schema != resolved_schema {
                continue;
            }
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            column_types.push((name.to_lowercase(), SqlType::from_database_name(&data_type)));
        }

        let types = columns
            .iter()
            .map(|column| {
                let column = column.to_lowercase();
                column_types
                    .iter()
                    .find(|(name, _)| *name == column)
                    .map(|(_, sql_type)| sql_type.clone())
            })
            .collect();
        Ok(ParameterMetadata::new(types))
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }
}

/// Split `schema.table` into catalog names, the schema being optional.
///
/// Quoted identifiers keep their case, unquoted ones are folded to lower case.
fn split_table_name(table: &str) -> (Option<String>, String) {
    match table.rsplit_once('.') {
        Some((schema, name)) => (Some(catalog_name(schema)), catalog_name(name)),
        None => (None, catalog_name(table)),
    }
}

fn catalog_name(identifier: &str) -> String {
    let identifier = identifier.trim();
    match identifier
        .strip_prefix('"')
        .and_then(|quoted| quoted.strip_suffix('"'))
    {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => identifier.to_lowercase(),
    }
}

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn bind_parameter<'q>(query: PgQuery<'q>, param: &BoundParameter) -> DbSetupResult<PgQuery<'q>> {
    let query = match (&param.value, param.sql_type.as_ref()) {
        (Value::Null, sql_type) => bind_null(query, sql_type),
        (Value::Text(s), Some(SqlType::Uuid)) => query.bind(
            Uuid::parse_str(s.trim()).map_err(|e| DbSetupError::conversion(s, "UUID", e))?,
        ),
        (Value::Text(s), Some(SqlType::Json)) => query.bind(
            serde_json::from_str::<serde_json::Value>(s)
                .map_err(|e| DbSetupError::conversion(s, "JSON", e))?,
        ),
        (Value::Text(s), Some(SqlType::Boolean)) => query.bind(parse_bool(s)?),
        (Value::Bool(b), _) => query.bind(*b),
        (Value::SmallInt(n), _) => query.bind(*n),
        (Value::Int(n), _) => query.bind(*n),
        (Value::BigInt(n), _) => query.bind(*n),
        (Value::Real(n), _) => query.bind(*n),
        (Value::Double(n), _) => query.bind(*n),
        (Value::Decimal(d), _) => query.bind(*d),
        (Value::Text(s), _) => query.bind(s.clone()),
        (Value::Date(d), _) => query.bind(*d),
        (Value::Time(t), _) => query.bind(*t),
        (Value::Timestamp(ts), _) => query.bind(*ts),
        (Value::TimestampTz(ts), _) => query.bind(*ts),
        (Value::Uuid(u), _) => query.bind(*u),
        (Value::Json(j), _) => query.bind(j.clone()),
        (Value::Bytes(b), _) => query.bind(b.clone()),
    };
    Ok(query)
}

/// NULL typed after the target column, text when unknown
fn bind_null<'q>(query: PgQuery<'q>, sql_type: Option<&SqlType>) -> PgQuery<'q> {
    match sql_type {
        Some(SqlType::Date) => query.bind(None::<NaiveDate>),
        Some(SqlType::Time) => query.bind(None::<NaiveTime>),
        Some(SqlType::Timestamp) => query.bind(None::<NaiveDateTime>),
        Some(SqlType::TimestampWithTimeZone) => query.bind(None::<DateTime<Utc>>),
        Some(SqlType::BigInt) => query.bind(None::<i64>),
        Some(SqlType::Integer) => query.bind(None::<i32>),
        Some(SqlType::SmallInt) | Some(SqlType::TinyInt) => query.bind(None::<i16>),
        Some(SqlType::Decimal) | Some(SqlType::Numeric) => query.bind(None::<Decimal>),
        Some(SqlType::Double) | Some(SqlType::Float) => query.bind(None::<f64>),
        Some(SqlType::Real) => query.bind(None::<f32>),
        Some(SqlType::Boolean) => query.bind(None::<bool>),
        Some(SqlType::Uuid) => query.bind(None::<Uuid>),
        Some(SqlType::Json) => query.bind(None::<serde_json::Value>),
        Some(SqlType::Binary) => query.bind(None::<Vec<u8>>),
        _ => query.bind(None::<String>),
    }
}

fn parse_bool(s: &str) -> DbSetupResult<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(DbSetupError::conversion(s, "BOOLEAN", "not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_table_name() {
        assert_eq!(split_table_name("vendor"), (None, "vendor".to_string()));
        assert_eq!(split_table_name("VENDOR"), (None, "vendor".to_string()));
        assert_eq!(
            split_table_name("shop.vendor"),
            (Some("shop".to_string()), "vendor".to_string())
        );
    }

    #[test]
    fn test_split_quoted_table_name() {
        assert_eq!(split_table_name("\"Vendor\""), (None, "Vendor".to_string()));
        assert_eq!(
            split_table_name("\"Shop\".\"Vendor\""),
            (Some("Shop".to_string()), "Vendor".to_string())
        );
        assert_eq!(split_table_name("\"a\"\"b\""), (None, "a\"b".to_string()));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool(" f ").unwrap());
        assert!(matches!(parse_bool("maybe"), Err(DbSetupError::Conversion { .. })));
    }

    #[test]
    fn test_url_destination_hides_password() {
        let destination = PgUrlDestination::with_credentials("postgres://localhost/db", "app", "secret");
        let debug = format!("{:?}", destination);
        assert!(debug.contains("app"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_url_destination_overrides_credentials() {
        let destination = PgUrlDestination::with_credentials("postgres://localhost:5433/db", "app", "secret");
        let options = destination.connect_options().unwrap();
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_port(), 5433);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let destination = PgUrlDestination::new("not a url");
        assert!(destination.connect_options().is_err());
    }
}
