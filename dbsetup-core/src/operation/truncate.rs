//! Table truncation

use async_trait::async_trait;
use std::fmt;
use tracing::debug;

use super::Executable;
use crate::bind::BinderConfiguration;
use crate::destination::Connection;
use crate::error::DbSetupResult;

/// `truncate table <table>`.
///
/// When truncating several tables referencing each other, list the
/// referencing tables first. Cycles need constraints disabled through
/// [`SqlOperation`](super::SqlOperation)s around the truncation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Truncate {
    table: String,
}

impl Truncate {
    /// Truncate `table`
    pub fn table(table: impl Into<String>) -> Self {
        Self { table: table.into() }
    }

    /// The truncated table
    pub fn table_name(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl Executable for Truncate {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        _configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        let sql = self.to_string();
        connection.execute(&sql).await?;
        debug!(table = %self.table, "Truncated table");
        Ok(())
    }
}

impl fmt::Display for Truncate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truncate table {}", self.table)
    }
}
