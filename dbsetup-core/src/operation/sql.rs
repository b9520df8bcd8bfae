//! Raw SQL statements

use async_trait::async_trait;
use std::fmt;
use tracing::debug;

use super::Executable;
use crate::bind::BinderConfiguration;
use crate::destination::Connection;
use crate::error::DbSetupResult;

/// A SQL statement executed as is, typically an update or a DDL statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlOperation {
    sql: String,
}

impl SqlOperation {
    /// Create an operation executing `sql`
    pub fn of(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    /// The statement
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

#[async_trait]
impl Executable for SqlOperation {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        _configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        let affected = connection.execute(&self.sql).await?;
        debug!(sql = %self.sql, affected, "Executed SQL statement");
        Ok(())
    }
}

impl fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}
