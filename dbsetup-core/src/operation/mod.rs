//! Database operations
//!
//! An [`Operation`] is an immutable description of what to do to the database:
//! insert rows, delete everything from a table, truncate, or run a statement.
//! Operations compose into sequences and are executed by a
//! [`DbSetup`](crate::DbSetup) inside a single transaction.

mod composite;
mod delete;
pub mod insert;
mod sql;
mod truncate;

pub use composite::CompositeOperation;
pub use delete::{Delete, DeleteAll};
pub use insert::Insert;
pub use sql::SqlOperation;
pub use truncate::Truncate;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::bind::BinderConfiguration;
use crate::destination::Connection;
use crate::error::DbSetupResult;
use crate::value::IntoNames;

/// Something that can be executed against a connection
#[async_trait]
pub trait Executable: fmt::Debug + fmt::Display + Send + Sync {
    /// Execute using the given connection and binder configuration
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()>;
}

// =============================================================================
// Operation
// =============================================================================

/// Any database operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert rows
    Insert(Insert),
    /// Delete the rows of an insert, by primary key
    Delete(Delete),
    /// Delete all rows of a table
    DeleteAll(DeleteAll),
    /// Truncate a table
    Truncate(Truncate),
    /// Execute a SQL statement
    Sql(SqlOperation),
    /// Execute operations in order
    Composite(CompositeOperation),
    /// Do nothing
    Nop,
    /// A user-provided operation
    Custom(CustomOperation),
}

impl Operation {
    /// Wrap a user-provided operation
    pub fn custom(operation: impl Executable + 'static) -> Self {
        Operation::Custom(CustomOperation(Arc::new(operation)))
    }
}

#[async_trait]
impl Executable for Operation {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        match self {
            Operation::Insert(op) => op.execute(connection, configuration).await,
            Operation::Delete(op) => op.execute(connection, configuration).await,
            Operation::DeleteAll(op) => op.execute(connection, configuration).await,
            Operation::Truncate(op) => op.execute(connection, configuration).await,
            Operation::Sql(op) => op.execute(connection, configuration).await,
            Operation::Composite(op) => op.execute(connection, configuration).await,
            Operation::Nop => Ok(()),
            Operation::Custom(op) => op.0.execute(connection, configuration).await,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert(op) => write!(f, "{}", op),
            Operation::Delete(op) => write!(f, "{}", op),
            Operation::DeleteAll(op) => write!(f, "{}", op),
            Operation::Truncate(op) => write!(f, "{}", op),
            Operation::Sql(op) => write!(f, "{}", op),
            Operation::Composite(op) => write!(f, "{}", op),
            Operation::Nop => write!(f, "NOP"),
            Operation::Custom(op) => write!(f, "{}", op.0),
        }
    }
}

macro_rules! impl_from_operation {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$ty(op)
                }
            }
        )*
    };
}

impl_from_operation!(Insert, Delete, DeleteAll, Truncate);

impl From<SqlOperation> for Operation {
    fn from(op: SqlOperation) -> Self {
        Operation::Sql(op)
    }
}

impl From<CompositeOperation> for Operation {
    fn from(op: CompositeOperation) -> Self {
        Operation::Composite(op)
    }
}

impl From<CustomOperation> for Operation {
    fn from(op: CustomOperation) -> Self {
        Operation::Custom(op)
    }
}

/// A user-provided operation, compared by identity
#[derive(Debug, Clone)]
pub struct CustomOperation(Arc<dyn Executable>);

impl CustomOperation {
    /// Wrap a shared user operation
    pub fn new(operation: Arc<dyn Executable>) -> Self {
        Self(operation)
    }
}

impl PartialEq for CustomOperation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// =============================================================================
// Factory functions
// =============================================================================

/// `delete from <table>` for each table, in order
pub fn delete_all_from(tables: impl IntoNames) -> Operation {
    sequence_of(tables.into_names().into_iter().map(DeleteAll::from_table))
}

/// Delete the rows inserted by `insert`, identified by `pk_column`
pub fn delete_from(insert: &Insert, pk_column: &str) -> DbSetupResult<Operation> {
    Delete::from_insert(insert, pk_column).map(Operation::Delete)
}

/// `truncate table <table>` for each table, in order
pub fn truncate(tables: impl IntoNames) -> Operation {
    sequence_of(tables.into_names().into_iter().map(Truncate::table))
}

/// Each SQL statement, in order
pub fn sql(statements: impl IntoNames) -> Operation {
    sequence_of(statements.into_names().into_iter().map(SqlOperation::of))
}

/// Start building an insert into `table`
pub fn insert_into(table: impl Into<String>) -> insert::Builder {
    Insert::into(table)
}

/// A sequence of operations
pub fn sequence_of<I>(operations: I) -> Operation
where
    I: IntoIterator,
    I::Item: Into<Operation>,
{
    CompositeOperation::sequence_of(operations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Reindex {
        table: String,
    }

    impl fmt::Display for Reindex {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "reindex {}", self.table)
        }
    }

    #[async_trait]
    impl Executable for Reindex {
        async fn execute(
            &self,
            connection: &mut dyn Connection,
            _configuration: &dyn BinderConfiguration,
        ) -> DbSetupResult<()> {
            connection.execute(&format!("reindex table {}", self.table)).await?;
            Ok(())
        }
    }

    fn reindex(table: &str) -> Reindex {
        Reindex {
            table: table.to_string(),
        }
    }

    #[test]
    fn test_custom_operations_compare_by_identity() {
        let first = Operation::custom(reindex("user"));
        let second = Operation::custom(reindex("user"));
        assert_ne!(first, second);
        assert_eq!(first, first.clone());

        let shared: Arc<dyn Executable> = Arc::new(reindex("user"));
        assert_eq!(
            Operation::from(CustomOperation::new(shared.clone())),
            Operation::from(CustomOperation::new(shared))
        );
    }

    #[tokio::test]
    async fn test_custom_operation_executes_and_displays() {
        let connection = crate::stub::RecordingConnection::new();
        let operation = sequence_of([delete_all_from("user"), Operation::custom(reindex("user"))]);

        operation
            .execute(&mut connection.clone(), &crate::DefaultBinderConfiguration)
            .await
            .unwrap();

        assert_eq!(
            connection.statements(),
            vec!["delete from user", "reindex table user"]
        );
        assert_eq!(operation.to_string(), "delete from user\nreindex user");
    }
}
