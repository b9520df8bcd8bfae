//! Accumulates operations into a [`DbSetup`].

use std::sync::Arc;
use tracing::debug;

use dbsetup_core::operation::insert;
use dbsetup_core::{
    BinderConfiguration, DbSetup, DbSetupError, DbSetupResult, DefaultBinderConfiguration,
    Destination, Insert, IntoDestination, IntoNames, Operation,
};

/// Builder of a [`DbSetup`], usually configured through
/// [`db_setup`](crate::db_setup).
///
/// Operations are executed in the order they are added. Errors of the
/// configured inserts are kept and the first one is returned by
/// [`build`](Self::build).
#[derive(Debug)]
pub struct DbSetupBuilder {
    destination: Option<Arc<dyn Destination>>,
    binder_configuration: Arc<dyn BinderConfiguration>,
    operations: Vec<Operation>,
    error: Option<DbSetupError>,
}

impl Default for DbSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DbSetupBuilder {
    /// Create a builder without destination, using the default binder configuration
    pub fn new() -> Self {
        Self {
            destination: None,
            binder_configuration: DefaultBinderConfiguration::shared(),
            operations: Vec::new(),
            error: None,
        }
    }

    /// Set the destination the setup is launched on
    pub fn destination(&mut self, destination: impl IntoDestination) -> &mut Self {
        self.destination = Some(destination.into_destination());
        self
    }

    /// Set the binder configuration used by inserts
    pub fn binder_configuration(&mut self, configuration: Arc<dyn BinderConfiguration>) -> &mut Self {
        self.binder_configuration = configuration;
        self
    }

    /// Add an insert into `table`, configured by `configure`:
    ///
    /// ```ignore
    /// setup.insert_into("user", |b| {
    ///     b.columns(["id", "name"]).values((1, "John"));
    /// });
    /// ```
    pub fn insert_into<F>(&mut self, table: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut insert::Builder),
    {
        match crate::insert_into(table, configure) {
            Ok(insert) => self.execute(insert),
            Err(e) => self.fail(e),
        }
    }

    /// Add `delete from <table>` for each table, in order
    pub fn delete_all_from(&mut self, tables: impl IntoNames) -> &mut Self {
        self.execute(dbsetup_core::delete_all_from(tables))
    }

    /// Add the deletion of the rows of `insert`, by primary key
    pub fn delete_from(&mut self, insert: &Insert, pk_column: &str) -> &mut Self {
        match dbsetup_core::delete_from(insert, pk_column) {
            Ok(operation) => self.execute(operation),
            Err(e) => self.fail(e),
        }
    }

    /// Add `truncate table <table>` for each table, in order
    pub fn truncate(&mut self, tables: impl IntoNames) -> &mut Self {
        self.execute(dbsetup_core::truncate(tables))
    }

    /// Add SQL statements, in order
    pub fn sql(&mut self, statements: impl IntoNames) -> &mut Self {
        self.execute(dbsetup_core::sql(statements))
    }

    /// Add any operation
    pub fn execute(&mut self, operation: impl Into<Operation>) -> &mut Self {
        self.operations.push(operation.into());
        self
    }

    /// Build the setup from the operations added so far.
    ///
    /// # Errors
    /// Returns the first error raised while configuring operations, or
    /// `DbSetupError::InvalidState` if no destination was set.
    pub fn build(&mut self) -> DbSetupResult<DbSetup> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        let destination = self
            .destination
            .clone()
            .ok_or_else(|| DbSetupError::invalid_state("destination hasn't been set"))?;

        let operations = std::mem::take(&mut self.operations);
        debug!(operations = operations.len(), "Built database setup");
        Ok(DbSetup::with_binder_configuration(
            destination,
            dbsetup_core::sequence_of(operations),
            self.binder_configuration.clone(),
        ))
    }

    fn fail(&mut self, error: DbSetupError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dbsetup_core::stub::{Recorded, RecordingDestination};
    use dbsetup_core::{Binder, Connection, Executable, ParameterMetadata};
    use std::fmt;
    use std::sync::Mutex;

    /// Operation remembering the binder configuration it was executed with
    #[derive(Debug, Default)]
    struct ConfigurationProbe {
        seen: Mutex<Vec<usize>>,
    }

    impl ConfigurationProbe {
        fn seen(&self) -> Vec<usize> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl fmt::Display for ConfigurationProbe {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "probe")
        }
    }

    #[async_trait]
    impl Executable for ConfigurationProbe {
        async fn execute(
            &self,
            _connection: &mut dyn Connection,
            configuration: &dyn BinderConfiguration,
        ) -> DbSetupResult<()> {
            let address = configuration as *const _ as *const () as usize;
            self.seen.lock().unwrap().push(address);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct TextConfiguration;

    impl BinderConfiguration for TextConfiguration {
        fn binder(&self, _metadata: Option<&ParameterMetadata>, _param: usize) -> DbSetupResult<Binder> {
            Ok(Binder::String)
        }
    }

    fn address_of(configuration: &Arc<dyn BinderConfiguration>) -> usize {
        Arc::as_ptr(configuration) as *const () as usize
    }

    #[tokio::test]
    async fn test_executes_an_operation_with_configuration() {
        let destination = Arc::new(RecordingDestination::new());
        let probe = Arc::new(ConfigurationProbe::default());
        let configuration: Arc<dyn BinderConfiguration> = Arc::new(TextConfiguration);

        let setup = DbSetupBuilder::new()
            .destination(&destination)
            .binder_configuration(configuration.clone())
            .execute(Operation::Custom(dbsetup_core::CustomOperation::new(probe.clone())))
            .build()
            .unwrap();
        setup.launch().await.unwrap();

        assert_eq!(probe.seen(), vec![address_of(&configuration)]);
    }

    #[tokio::test]
    async fn test_uses_default_binder_configuration_if_not_set() {
        let destination = Arc::new(RecordingDestination::new());
        let probe = Arc::new(ConfigurationProbe::default());

        let setup = DbSetupBuilder::new()
            .destination(&destination)
            .execute(Operation::Custom(dbsetup_core::CustomOperation::new(probe.clone())))
            .build()
            .unwrap();
        setup.launch().await.unwrap();

        assert_eq!(
            probe.seen(),
            vec![address_of(&DefaultBinderConfiguration::shared())]
        );
    }

    #[test]
    fn test_fails_if_destination_not_set() {
        let result = DbSetupBuilder::new().sql("select 1").build();
        match result {
            Err(DbSetupError::InvalidState(message)) => {
                assert_eq!(message, "destination hasn't been set")
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_operations_in_order() {
        let destination = Arc::new(RecordingDestination::new());

        DbSetupBuilder::new()
            .destination(&destination)
            .delete_all_from(["country", "user"])
            .truncate("audit")
            .sql(vec!["update foo set bar = 1", "update baz set qux = 1"])
            .build()
            .unwrap()
            .launch()
            .await
            .unwrap();

        assert_eq!(
            destination.connection_handle().statements(),
            vec![
                "delete from country",
                "delete from user",
                "truncate table audit",
                "update foo set bar = 1",
                "update baz set qux = 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_insert() {
        let destination = Arc::new(RecordingDestination::new());

        DbSetupBuilder::new()
            .destination(&destination)
            .insert_into("user", |b| {
                b.columns(["id", "name"]).values((1, "John"));
            })
            .build()
            .unwrap()
            .launch()
            .await
            .unwrap();

        let recorded = destination.connection_handle().recorded();
        assert_eq!(recorded.len(), 3);
        match &recorded[1] {
            Recorded::Prepared { sql, params } => {
                assert_eq!(sql, "insert into user (id, name) values (?, ?)");
                assert_eq!(params[0].value, 1.into());
                assert_eq!(params[1].value, "John".into());
            },
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_first_insert_error_is_returned() {
        let destination = Arc::new(RecordingDestination::new());

        let result = DbSetupBuilder::new()
            .destination(&destination)
            .insert_into("user", |b| {
                b.columns(["id", "name"]).values([1]);
            })
            .insert_into("country", |_| {})
            .build();

        assert!(matches!(result, Err(DbSetupError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_delete_from_insert() {
        let destination = Arc::new(RecordingDestination::new());
        let users = crate::insert_into("user", |b| {
            b.columns(["id", "name"]).values((1, "John")).values((2, "Jack"));
        })
        .unwrap();

        DbSetupBuilder::new()
            .destination(&destination)
            .delete_from(&users, "id")
            .build()
            .unwrap()
            .launch()
            .await
            .unwrap();

        assert_eq!(
            destination.connection_handle().statements(),
            vec!["delete from user where id in (1, 2)"]
        );
    }

    #[test]
    fn test_empty_setup_is_nop() {
        let destination = Arc::new(RecordingDestination::new());
        let setup = DbSetupBuilder::new().destination(&destination).build().unwrap();
        assert_eq!(setup.operation(), &Operation::Nop);
    }
}
