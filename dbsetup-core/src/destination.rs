//! Connection and destination ports
//!
//! These traits define what the engine needs from a database. Adapters
//! implement them for PostgreSQL (feature `postgres`) and for tests
//! ([`stub`](crate::stub)).

use async_trait::async_trait;
use std::sync::Arc;

use crate::bind::{ParameterMetadata, SqlType};
use crate::error::DbSetupResult;
use crate::value::Value;

/// A value bound to a statement parameter, with its SQL type when metadata knows it
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Value produced by the binder
    pub value: Value,
    /// Type of the target column, if known
    pub sql_type: Option<SqlType>,
}

impl BoundParameter {
    /// Create a bound parameter
    pub fn new(value: Value, sql_type: Option<SqlType>) -> Self {
        Self { value, sql_type }
    }
}

/// An open database connection used by operations
#[async_trait]
pub trait Connection: Send {
    /// Start the transaction grouping all operations of a launch
    async fn begin(&mut self) -> DbSetupResult<()>;

    /// Commit the current transaction
    async fn commit(&mut self) -> DbSetupResult<()>;

    /// Roll back the current transaction
    async fn rollback(&mut self) -> DbSetupResult<()>;

    /// Execute a statement without parameters, returning the affected row count
    async fn execute(&mut self, sql: &str) -> DbSetupResult<u64>;

    /// Execute a statement with parameters, returning the affected row count
    async fn execute_prepared(&mut self, sql: &str, params: &[BoundParameter]) -> DbSetupResult<u64>;

    /// Describe the parameters of an insert into `table` for `columns`.
    ///
    /// Connections that cannot describe parameters return an error; inserts
    /// then fall back to binding without metadata.
    async fn parameter_metadata(
        &mut self,
        table: &str,
        columns: &[String],
    ) -> DbSetupResult<ParameterMetadata>;

    /// Placeholder for the parameter at the 1-based `position`
    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }
}

/// Source of connections for a launch
#[async_trait]
pub trait Destination: std::fmt::Debug + Send + Sync {
    /// Open (or acquire) a connection
    async fn connection(&self) -> DbSetupResult<Box<dyn Connection>>;
}

/// Conversion into a shared destination.
///
/// Setups compare destinations by identity, so sharing one `Arc` across setups
/// lets the tracker recognize them as identical.
pub trait IntoDestination {
    /// Convert into a shared destination
    fn into_destination(self) -> Arc<dyn Destination>;
}

impl IntoDestination for Arc<dyn Destination> {
    fn into_destination(self) -> Arc<dyn Destination> {
        self
    }
}

impl IntoDestination for &Arc<dyn Destination> {
    fn into_destination(self) -> Arc<dyn Destination> {
        Arc::clone(self)
    }
}

impl<D: Destination + 'static> IntoDestination for Arc<D> {
    fn into_destination(self) -> Arc<dyn Destination> {
        self
    }
}

impl<D: Destination + 'static> IntoDestination for &Arc<D> {
    fn into_destination(self) -> Arc<dyn Destination> {
        Arc::clone(self) as Arc<dyn Destination>
    }
}
