//! Delete operations

use async_trait::async_trait;
use std::fmt;
use tracing::debug;

use super::{Executable, Insert};
use crate::bind::BinderConfiguration;
use crate::destination::Connection;
use crate::error::{DbSetupError, DbSetupResult};

// =============================================================================
// DeleteAll
// =============================================================================

/// `delete from <table>`.
///
/// When deleting from several tables, list the referencing tables first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteAll {
    table: String,
}

impl DeleteAll {
    /// Delete all rows of `table`
    pub fn from_table(table: impl Into<String>) -> Self {
        Self { table: table.into() }
    }

    /// The table emptied by this operation
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl Executable for DeleteAll {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        _configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        let affected = connection.execute(&self.to_string()).await?;
        debug!(table = %self.table, affected, "Deleted all rows");
        Ok(())
    }
}

impl fmt::Display for DeleteAll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delete from {}", self.table)
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Deletes the rows inserted by an [`Insert`], identified by their primary key.
///
/// Useful to clean up exactly what a fixture created:
/// `delete from <table> where <pk> in (<pk of each row>)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delete {
    table: String,
    pk_column: String,
    sql: String,
}

impl Delete {
    /// Build the delete of the rows of `insert`.
    ///
    /// # Errors
    /// Returns `DbSetupError::InvalidArgument` if `pk_column` is not a column
    /// of the insert, and `DbSetupError::InvalidState` if it has no row.
    pub fn from_insert(insert: &Insert, pk_column: &str) -> DbSetupResult<Self> {
        let primary_keys = insert.column_values(pk_column).ok_or_else(|| {
            DbSetupError::invalid_argument(format!(
                "insert should contain a column named '{}'",
                pk_column
            ))
        })?;
        if primary_keys.is_empty() {
            return Err(DbSetupError::invalid_state(
                "insert should contain at least one row to delete",
            ));
        }

        let literals: Vec<String> = primary_keys.iter().map(|pk| pk.to_sql_literal()).collect();
        let sql = format!(
            "delete from {} where {} in ({})",
            insert.table(),
            pk_column,
            literals.join(", ")
        );

        Ok(Self {
            table: insert.table().to_string(),
            pk_column: pk_column.to_string(),
            sql,
        })
    }

    /// The table rows are deleted from
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The primary key column
    pub fn pk_column(&self) -> &str {
        &self.pk_column
    }
}

#[async_trait]
impl Executable for Delete {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        _configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        let affected = connection.execute(&self.sql).await?;
        debug!(table = %self.table, affected, "Deleted inserted rows");
        Ok(())
    }
}

impl fmt::Display for Delete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;
    use crate::operation::{delete_all_from, Operation};
    use crate::stub::RecordingConnection;
    use crate::DefaultBinderConfiguration;

    #[tokio::test]
    async fn test_delete_all_from_one_table() {
        let mut connection = RecordingConnection::new();
        DeleteAll::from_table("user")
            .execute(&mut connection, &DefaultBinderConfiguration)
            .await
            .unwrap();
        assert_eq!(connection.statements(), vec!["delete from user"]);
    }

    #[tokio::test]
    async fn test_delete_all_from_several_tables() {
        let mut connection = RecordingConnection::new();
        delete_all_from(vec!["country", "user"])
            .execute(&mut connection, &DefaultBinderConfiguration)
            .await
            .unwrap();
        assert_eq!(
            connection.statements(),
            vec!["delete from country", "delete from user"]
        );
    }

    #[test]
    fn test_delete_all_display_and_equality() {
        assert_eq!(DeleteAll::from_table("A").to_string(), "delete from A");
        assert_eq!(delete_all_from("A"), Operation::DeleteAll(DeleteAll::from_table("A")));
        assert_ne!(DeleteAll::from_table("A"), DeleteAll::from_table("B"));
    }

    #[tokio::test]
    async fn test_delete_rows_of_insert() {
        let insert = Insert::into("user")
            .columns(["id", "name"])
            .values((1, "John"))
            .values((2, "Jack"))
            .build()
            .unwrap();
        let delete = Delete::from_insert(&insert, "id").unwrap();

        let mut connection = RecordingConnection::new();
        delete
            .execute(&mut connection, &DefaultBinderConfiguration)
            .await
            .unwrap();

        assert_eq!(connection.statements(), vec!["delete from user where id in (1, 2)"]);
    }

    #[test]
    fn test_delete_quotes_text_keys() {
        let insert = Insert::into("country")
            .columns(["code"])
            .values(["FR"])
            .values(["CI"])
            .build()
            .unwrap();
        let delete = Delete::from_insert(&insert, "code").unwrap();
        assert_eq!(delete.to_string(), "delete from country where code in ('FR', 'CI')");
    }

    #[test]
    fn test_delete_on_generated_column() {
        let insert = Insert::into("user")
            .columns(["name"])
            .values(["John"])
            .values(["Jack"])
            .with_generated_value("id", generator::sequence().starting_at(10))
            .build()
            .unwrap();
        let delete = Delete::from_insert(&insert, "id").unwrap();
        assert_eq!(delete.to_string(), "delete from user where id in (10, 11)");
    }

    #[test]
    fn test_delete_rejects_unknown_column() {
        let insert = Insert::into("user").columns(["id"]).values([1]).build().unwrap();
        assert!(matches!(
            Delete::from_insert(&insert, "code"),
            Err(DbSetupError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_delete_rejects_insert_without_rows() {
        let insert = Insert::into("user").columns(["id"]).build().unwrap();
        assert!(matches!(
            Delete::from_insert(&insert, "id"),
            Err(DbSetupError::InvalidState(_))
        ));
    }
}
