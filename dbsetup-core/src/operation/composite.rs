//! Sequences of operations

use async_trait::async_trait;
use std::fmt;
use tracing::debug;

use super::{Executable, Operation};
use crate::bind::BinderConfiguration;
use crate::destination::Connection;
use crate::error::DbSetupResult;

/// Operations executed in order, stopping at the first failure
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOperation {
    operations: Vec<Operation>,
}

impl CompositeOperation {
    /// Build a sequence.
    ///
    /// An empty sequence is [`Operation::Nop`] and a single operation is
    /// returned unwrapped.
    pub fn sequence_of<I>(operations: I) -> Operation
    where
        I: IntoIterator,
        I::Item: Into<Operation>,
    {
        let mut operations: Vec<Operation> = operations.into_iter().map(Into::into).collect();
        match operations.len() {
            0 => Operation::Nop,
            1 => operations.remove(0),
            _ => Operation::Composite(CompositeOperation { operations }),
        }
    }

    /// The operations of the sequence
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

#[async_trait]
impl Executable for CompositeOperation {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        debug!(count = self.operations.len(), "Executing operation sequence");
        for operation in &self.operations {
            operation.execute(connection, configuration).await?;
        }
        Ok(())
    }
}

impl fmt::Display for CompositeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, operation) in self.operations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", operation)?;
        }
        Ok(())
    }
}
