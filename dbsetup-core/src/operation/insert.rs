//! Row insertion
//!
//! An [`Insert`] is built with a [`Builder`]: declare the columns, add rows
//! (as ordered values, as name/value pairs, or column by column), optionally
//! add generated columns and explicit binders, then call [`Builder::build`].
//!
//! ```ignore
//! let insert = Insert::into("VENDOR")
//!     .columns(["ID", "CODE", "NAME"])
//!     .values((1, "AMA", "AMAZON"))
//!     .values((2, "PMI", "PriceMinister"))
//!     .with_default_value("COUNTRY", "FR")
//!     .build()?;
//! ```
//!
//! Builder misuse never panics: the first error is kept and returned by
//! `build()`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use super::Executable;
use crate::bind::{Binder, BinderConfiguration};
use crate::destination::{BoundParameter, Connection};
use crate::error::{DbSetupError, DbSetupResult};
use crate::generator::{constant, ValueGenerator};
use crate::value::{IntoNames, IntoValues, Value};

const ALREADY_BUILT: &str = "The insert has already been built";

// =============================================================================
// Insert
// =============================================================================

/// Inserts rows into a table, one prepared statement execution per row
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: String,
    column_names: Vec<String>,
    /// Generated columns in declaration order, one value per row
    generated_values: Vec<(String, Vec<Value>)>,
    rows: Vec<Vec<Value>>,
    metadata_used: bool,
    binders: BTreeMap<String, Binder>,
}

impl Insert {
    /// Start building an insert into `table`
    pub fn into(table: impl Into<String>) -> Builder {
        Builder::new(table.into())
    }

    /// Number of inserted rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The target table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The explicit columns, without generated ones
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// The explicit values of each row
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Whether parameter metadata is requested before binding
    pub fn metadata_used(&self) -> bool {
        self.metadata_used
    }

    /// The value of `column` in each row, for an explicit or generated column
    pub fn column_values(&self, column: &str) -> Option<Vec<Value>> {
        if let Some(index) = self.column_names.iter().position(|c| c == column) {
            return Some(self.rows.iter().map(|row| row[index].clone()).collect());
        }
        self.generated_values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.clone())
    }

    fn all_column_names(&self) -> Vec<String> {
        self.column_names
            .iter()
            .cloned()
            .chain(self.generated_values.iter().map(|(name, _)| name.clone()))
            .collect()
    }
}

#[async_trait]
impl Executable for Insert {
    async fn execute(
        &self,
        connection: &mut dyn Connection,
        configuration: &dyn BinderConfiguration,
    ) -> DbSetupResult<()> {
        let all_columns = self.all_column_names();
        let placeholders: Vec<String> =
            (1..=all_columns.len()).map(|position| connection.placeholder(position)).collect();
        let sql = format!(
            "insert into {} ({}) values ({})",
            self.table,
            all_columns.join(", "),
            placeholders.join(", ")
        );

        let metadata = if self.metadata_used && configuration.metadata_enabled() {
            match connection.parameter_metadata(&self.table, &all_columns).await {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    warn!(table = %self.table, error = %e, "Parameter metadata unavailable, binding without it");
                    None
                },
            }
        } else {
            None
        };

        let binders = all_columns
            .iter()
            .enumerate()
            .map(|(param, column)| match self.binders.get(column) {
                Some(binder) => Ok(*binder),
                None => configuration.binder(metadata.as_ref(), param),
            })
            .collect::<DbSetupResult<Vec<Binder>>>()?;

        for (row_index, row) in self.rows.iter().enumerate() {
            let generated = self.generated_values.iter().map(|(_, values)| &values[row_index]);
            let params = row
                .iter()
                .chain(generated)
                .zip(&binders)
                .enumerate()
                .map(|(param, (value, binder))| {
                    let sql_type = metadata
                        .as_ref()
                        .and_then(|m| m.parameter_type(param))
                        .cloned();
                    Ok(BoundParameter::new(binder.bind(value)?, sql_type))
                })
                .collect::<DbSetupResult<Vec<_>>>()?;
            connection.execute_prepared(&sql, &params).await?;
        }

        debug!(table = %self.table, rows = self.rows.len(), "Inserted rows");
        Ok(())
    }
}

impl fmt::Display for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insert into {} [columns={:?}, generated_values={:?}, rows={:?}, metadata_used={}, binders={:?}]",
            self.table,
            self.column_names,
            self.generated_values,
            self.rows,
            self.metadata_used,
            self.binders
        )
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder of an [`Insert`]
#[derive(Debug)]
pub struct Builder {
    table: String,
    column_names: Vec<String>,
    generators: Vec<(String, Box<dyn ValueGenerator>)>,
    rows: Vec<Vec<Value>>,
    metadata_used: bool,
    binders: BTreeMap<String, Binder>,
    error: Option<DbSetupError>,
    built: bool,
}

impl Builder {
    fn new(table: String) -> Self {
        Self {
            table,
            column_names: Vec::new(),
            generators: Vec::new(),
            rows: Vec::new(),
            metadata_used: true,
            binders: BTreeMap::new(),
            error: None,
            built: false,
        }
    }

    /// Declare the columns of the inserted rows. Can only be called once.
    pub fn columns(&mut self, names: impl IntoNames) -> &mut Self {
        if !self.ready() {
            return self;
        }
        if !self.column_names.is_empty() {
            self.fail(DbSetupError::invalid_state("columns have already been specified"));
            return self;
        }
        let names = names.into_names();
        if let Some(generated) = names.iter().find(|name| self.is_generated(name)) {
            let error = DbSetupError::invalid_state(format!(
                "column {} has already been specified as generated value column",
                generated
            ));
            self.fail(error);
            return self;
        }
        self.column_names = names;
        self
    }

    /// Add a row. Values are in the order of the columns.
    pub fn values(&mut self, row: impl IntoValues) -> &mut Self {
        self.add_repeating_values(row.into_values(), 1)
    }

    /// Add a row given as column/value pairs.
    ///
    /// If neither columns nor rows were added yet, the keys become the
    /// columns, in iteration order. Columns missing from the pairs are NULL.
    pub fn mapped_values<I, K, V>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.add_repeating_mapped_values(collect_pairs(row), 1)
    }

    /// Add the same row several times: `repeating_values(row).times(n)`
    pub fn repeating_values(&mut self, row: impl IntoValues) -> RowRepeater<'_> {
        RowRepeater {
            builder: self,
            row: PendingRow::Values(row.into_values()),
        }
    }

    /// Add the same mapped row several times
    pub fn repeating_mapped_values<I, K, V>(&mut self, row: I) -> RowRepeater<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        RowRepeater {
            builder: self,
            row: PendingRow::Mapped(collect_pairs(row)),
        }
    }

    /// Add a row column by column, ended with [`RowBuilder::end`] or
    /// [`RowBuilder::times`]
    pub fn row(&mut self) -> RowBuilder<'_> {
        self.ready();
        RowBuilder {
            builder: self,
            row: Vec::new(),
        }
    }

    /// Use `binder` for the given explicit or generated columns
    pub fn with_binder(&mut self, binder: Binder, columns: impl IntoNames) -> &mut Self {
        if !self.ready() {
            return self;
        }
        for column in columns.into_names() {
            if !self.column_names.contains(&column) && !self.is_generated(&column) {
                self.fail(DbSetupError::invalid_argument(format!(
                    "column {} is not one of the registered column names",
                    column
                )));
                return self;
            }
            self.binders.insert(column, binder);
        }
        self
    }

    /// Add a column with the same value in every row
    pub fn with_default_value(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.with_generated_value(column, constant(value))
    }

    /// Add a column whose values are drawn from `generator`, one per row
    pub fn with_generated_value(
        &mut self,
        column: impl Into<String>,
        generator: impl ValueGenerator + 'static,
    ) -> &mut Self {
        if !self.ready() {
            return self;
        }
        let column = column.into();
        if self.column_names.contains(&column) {
            self.fail(DbSetupError::invalid_argument(format!(
                "column {} is already listed in the list of column names",
                column
            )));
            return self;
        }
        let generator: Box<dyn ValueGenerator> = Box::new(generator);
        match self.generators.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = generator,
            None => self.generators.push((column, generator)),
        }
        self
    }

    /// Whether to ask the connection for parameter metadata (default `true`)
    pub fn use_metadata(&mut self, use_metadata: bool) -> &mut Self {
        if self.ready() {
            self.metadata_used = use_metadata;
        }
        self
    }

    /// Build the insert, drawing generated values for every row.
    ///
    /// # Errors
    /// Returns the first error recorded by the builder, or
    /// `DbSetupError::InvalidState` if the insert was already built or has no
    /// column at all.
    pub fn build(&mut self) -> DbSetupResult<Insert> {
        if self.built {
            return Err(DbSetupError::invalid_state(ALREADY_BUILT));
        }
        self.built = true;
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if self.column_names.is_empty() && self.generators.is_empty() {
            return Err(DbSetupError::invalid_state(
                "no column and no generated value column has been specified",
            ));
        }

        let row_count = self.rows.len();
        let generated_values = self
            .generators
            .iter_mut()
            .map(|(name, generator)| {
                let values = (0..row_count).map(|_| generator.next_value()).collect();
                (name.clone(), values)
            })
            .collect();

        Ok(Insert {
            table: self.table.clone(),
            column_names: std::mem::take(&mut self.column_names),
            generated_values,
            rows: std::mem::take(&mut self.rows),
            metadata_used: self.metadata_used,
            binders: std::mem::take(&mut self.binders),
        })
    }

    fn is_generated(&self, column: &str) -> bool {
        self.generators.iter().any(|(name, _)| name == column)
    }

    /// Keep the first error only
    fn fail(&mut self, error: DbSetupError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn ready(&mut self) -> bool {
        if self.built {
            self.fail(DbSetupError::invalid_state(ALREADY_BUILT));
        }
        self.error.is_none()
    }

    fn add_repeating_values(&mut self, row: Vec<Value>, times: usize) -> &mut Self {
        if !self.ready() {
            return self;
        }
        if row.len() != self.column_names.len() {
            self.fail(DbSetupError::invalid_argument(
                "The number of values doesn't match the number of columns",
            ));
            return self;
        }
        for _ in 0..times {
            self.rows.push(row.clone());
        }
        self
    }

    fn add_repeating_mapped_values(&mut self, row: Vec<(String, Value)>, times: usize) -> &mut Self {
        if !self.ready() {
            return self;
        }
        if let Some(values) = self.map_to_row(row) {
            for _ in 0..times {
                self.rows.push(values.clone());
            }
        }
        self
    }

    fn map_to_row(&mut self, mut row: Vec<(String, Value)>) -> Option<Vec<Value>> {
        if self.rows.is_empty() && self.column_names.is_empty() {
            let names: Vec<String> = row.iter().map(|(name, _)| name.clone()).collect();
            self.columns(names);
            if self.error.is_some() {
                return None;
            }
        } else {
            let unknown: Vec<&str> = row
                .iter()
                .map(|(name, _)| name.as_str())
                .filter(|name| !self.column_names.iter().any(|c| c == name))
                .collect();
            if !unknown.is_empty() {
                let error = DbSetupError::invalid_argument(format!(
                    "The following columns of the row don't match with any column name: [{}]",
                    unknown.join(", ")
                ));
                self.fail(error);
                return None;
            }
        }

        let values = self
            .column_names
            .iter()
            .map(|column| match row.iter().position(|(name, _)| name == column) {
                Some(index) => std::mem::take(&mut row[index].1),
                None => Value::Null,
            })
            .collect();
        Some(values)
    }
}

/// Collect pairs, a repeated key keeping its first position and last value
fn collect_pairs<I, K, V>(row: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut pairs: Vec<(String, Value)> = Vec::new();
    for (name, value) in row {
        let (name, value) = (name.into(), value.into());
        match pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => pairs.push((name, value)),
        }
    }
    pairs
}

// =============================================================================
// Row helpers
// =============================================================================

#[derive(Debug)]
enum PendingRow {
    Values(Vec<Value>),
    Mapped(Vec<(String, Value)>),
}

/// A row waiting to be added a number of times
#[derive(Debug)]
#[must_use = "the row is only added by calling times()"]
pub struct RowRepeater<'a> {
    builder: &'a mut Builder,
    row: PendingRow,
}

impl<'a> RowRepeater<'a> {
    /// Add the row `times` times
    pub fn times(self, times: usize) -> &'a mut Builder {
        match self.row {
            PendingRow::Values(values) => self.builder.add_repeating_values(values, times),
            PendingRow::Mapped(pairs) => self.builder.add_repeating_mapped_values(pairs, times),
        }
    }
}

/// A row built column by column
#[derive(Debug)]
#[must_use = "the row is only added by calling end() or times()"]
pub struct RowBuilder<'a> {
    builder: &'a mut Builder,
    row: Vec<(String, Value)>,
}

impl<'a> RowBuilder<'a> {
    /// Set the value of a column.
    ///
    /// When the columns are already declared, `name` must be one of them.
    pub fn column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let registered = &self.builder.column_names;
        if !registered.is_empty() && !registered.contains(&name) {
            self.builder.fail(DbSetupError::invalid_argument(format!(
                "column {} is not one of the registered column names",
                name
            )));
            return self;
        }
        let value = value.into();
        match self.row.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.row.push((name, value)),
        }
        self
    }

    /// Add the row once
    pub fn end(self) -> &'a mut Builder {
        self.builder.add_repeating_mapped_values(self.row, 1)
    }

    /// Add the row `times` times
    pub fn times(self, times: usize) -> &'a mut Builder {
        self.builder.add_repeating_mapped_values(self.row, times)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{ParameterMetadata, SqlType};
    use crate::generator;
    use crate::stub::RecordingConnection;
    use crate::bind::DisabledBinderConfiguration;
    use crate::DefaultBinderConfiguration;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Records the requested parameter indices and always answers the string binder
    #[derive(Debug, Default)]
    struct TrackingConfiguration {
        requested: Mutex<Vec<(bool, usize)>>,
    }

    impl BinderConfiguration for TrackingConfiguration {
        fn binder(&self, metadata: Option<&ParameterMetadata>, param: usize) -> DbSetupResult<Binder> {
            self.requested.lock().unwrap().push((metadata.is_some(), param));
            Ok(Binder::String)
        }
    }

    fn values_of(params: &[BoundParameter]) -> Vec<Value> {
        params.iter().map(|p| p.value.clone()).collect()
    }

    #[tokio::test]
    async fn test_execute_binds_explicit_then_generated_columns() {
        let insert = Insert::into("A")
            .columns(["a", "b"])
            .values(("1", "2"))
            .row()
            .column("b", "4")
            .column("a", "3")
            .end()
            .with_generated_value("c", generator::sequence())
            .with_binder(Binder::Integer, "a")
            .build()
            .unwrap();

        let mut connection = RecordingConnection::new();
        let configuration = TrackingConfiguration::default();
        insert.execute(&mut connection, &configuration).await.unwrap();

        assert_eq!(
            connection.statements(),
            vec!["insert into A (a, b, c) values (?, ?, ?)"; 2]
        );
        let params = connection.prepared_params();
        assert_eq!(
            values_of(&params[0]),
            vec![Value::BigInt(1), Value::from("2"), Value::from("1")]
        );
        assert_eq!(
            values_of(&params[1]),
            vec![Value::BigInt(3), Value::from("4"), Value::from("2")]
        );
        // only the columns without explicit binder are looked up
        assert_eq!(
            *configuration.requested.lock().unwrap(),
            vec![(true, 1), (true, 2)]
        );
    }

    #[tokio::test]
    async fn test_metadata_types_drive_default_binders() {
        let insert = Insert::into("A")
            .columns(["day", "amount"])
            .values(("2013-07-19", "12.5"))
            .build()
            .unwrap();

        let mut connection = RecordingConnection::new();
        connection.set_column_type("A", "day", SqlType::Date);
        insert
            .execute(&mut connection, &DefaultBinderConfiguration)
            .await
            .unwrap();

        let params = &connection.prepared_params()[0];
        assert_eq!(
            params[0].value,
            Value::Date(NaiveDate::from_ymd_opt(2013, 7, 19).unwrap())
        );
        assert_eq!(params[0].sql_type, Some(SqlType::Date));
        assert_eq!(params[1].value, Value::from("12.5"));
        assert_eq!(params[1].sql_type, None);
    }

    #[tokio::test]
    async fn test_metadata_failure_binds_without_metadata() {
        let insert = Insert::into("A").columns(["a"]).values(["x"]).build().unwrap();

        let mut connection = RecordingConnection::new();
        connection.set_metadata_supported(false);
        let configuration = TrackingConfiguration::default();
        insert.execute(&mut connection, &configuration).await.unwrap();

        assert_eq!(*configuration.requested.lock().unwrap(), vec![(false, 0)]);
        assert_eq!(connection.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_not_requested_when_disabled() {
        let insert = Insert::into("A")
            .columns(["a"])
            .values(["x"])
            .use_metadata(false)
            .build()
            .unwrap();

        let mut connection = RecordingConnection::new();
        let configuration = TrackingConfiguration::default();
        insert.execute(&mut connection, &configuration).await.unwrap();

        assert_eq!(connection.metadata_requests(), 0);
        assert_eq!(*configuration.requested.lock().unwrap(), vec![(false, 0)]);
    }

    #[tokio::test]
    async fn test_disabled_configuration_requires_explicit_binders() {
        let mut connection = RecordingConnection::new();
        connection.set_column_type("A", "a", SqlType::Integer);

        let explicit = Insert::into("A")
            .columns(["a"])
            .values(["7"])
            .with_binder(Binder::Integer, "a")
            .build()
            .unwrap();
        explicit
            .execute(&mut connection, &DisabledBinderConfiguration)
            .await
            .unwrap();
        assert_eq!(values_of(&connection.prepared_params()[0]), vec![Value::BigInt(7)]);
        assert_eq!(connection.metadata_requests(), 0);

        let implicit = Insert::into("A").columns(["a"]).values(["8"]).build().unwrap();
        let result = implicit
            .execute(&mut connection, &DisabledBinderConfiguration)
            .await;
        assert!(matches!(result, Err(DbSetupError::Unsupported(_))));
        assert_eq!(connection.prepared_params().len(), 1);
    }

    #[tokio::test]
    async fn test_numbered_placeholders() {
        let insert = Insert::into("A")
            .columns(["a", "b"])
            .values((1, 2))
            .build()
            .unwrap();

        let mut connection = RecordingConnection::new();
        connection.use_numbered_placeholders();
        insert
            .execute(&mut connection, &DefaultBinderConfiguration)
            .await
            .unwrap();

        assert_eq!(connection.statements(), vec!["insert into A (a, b) values ($1, $2)"]);
    }

    #[tokio::test]
    async fn test_binder_conversion_error_stops_execution() {
        let insert = Insert::into("A")
            .columns(["a"])
            .values(["not a number"])
            .with_binder(Binder::Integer, "a")
            .build()
            .unwrap();

        let mut connection = RecordingConnection::new();
        let result = insert.execute(&mut connection, &DefaultBinderConfiguration).await;

        assert!(matches!(result, Err(DbSetupError::Conversion { .. })));
        assert!(connection.statements().is_empty());
    }

    #[test]
    fn test_mapped_values_set_columns_from_first_row() {
        let insert = Insert::into("A")
            .mapped_values([("a", Value::from(1)), ("b", Value::from("x"))])
            .mapped_values([("b", "y")])
            .build()
            .unwrap();

        assert_eq!(insert.column_names(), ["a", "b"]);
        assert_eq!(
            insert.rows(),
            [
                vec![Value::Int(1), Value::from("x")],
                vec![Value::Null, Value::from("y")],
            ]
        );
    }

    #[test]
    fn test_mapped_values_reject_unknown_columns() {
        let result = Insert::into("A")
            .columns(["a"])
            .mapped_values([("b", 1), ("c", 2)])
            .build();

        match result {
            Err(DbSetupError::InvalidArgument(message)) => assert!(message.contains("[b, c]")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_repeating_rows() {
        let insert = Insert::into("A")
            .columns(["a", "b"])
            .repeating_values((1, "x"))
            .times(3)
            .repeating_mapped_values([("b", "y")])
            .times(2)
            .row()
            .column("a", 9)
            .times(0)
            .build()
            .unwrap();

        assert_eq!(insert.row_count(), 5);
        assert_eq!(insert.rows()[4], vec![Value::Null, Value::from("y")]);
    }

    #[test]
    fn test_row_without_columns_sets_columns() {
        let insert = Insert::into("A")
            .row()
            .column("x", 1)
            .column("y", 2)
            .end()
            .build()
            .unwrap();
        assert_eq!(insert.column_names(), ["x", "y"]);
    }

    #[test]
    fn test_generated_values_drawn_per_row() {
        let insert = Insert::into("A")
            .columns(["a"])
            .values(["x"])
            .values(["y"])
            .with_generated_value("id", generator::sequence().starting_at(5))
            .with_default_value("kind", "K")
            .build()
            .unwrap();

        assert_eq!(
            insert.column_values("id"),
            Some(vec![Value::BigInt(5), Value::BigInt(6)])
        );
        assert_eq!(
            insert.column_values("kind"),
            Some(vec![Value::from("K"), Value::from("K")])
        );
        assert_eq!(insert.column_values("a"), Some(vec![Value::from("x"), Value::from("y")]));
        assert_eq!(insert.column_values("missing"), None);
    }

    #[test]
    fn test_only_generated_columns() {
        let insert = Insert::into("A")
            .with_generated_value("id", generator::sequence())
            .build()
            .unwrap();
        assert_eq!(insert.row_count(), 0);
    }

    #[test]
    fn test_equality() {
        let build = || {
            Insert::into("A")
                .columns(["a"])
                .values([1])
                .with_generated_value("id", generator::sequence())
                .build()
                .unwrap()
        };
        assert_eq!(build(), build());

        let other = Insert::into("A")
            .columns(["a"])
            .values([1])
            .use_metadata(false)
            .build()
            .unwrap();
        assert_ne!(Insert::into("A").columns(["a"]).values([1]).build().unwrap(), other);
    }

    #[test]
    fn test_display() {
        let insert = Insert::into("A").columns(["a"]).values([1]).build().unwrap();
        assert!(insert.to_string().starts_with("insert into A [columns=[\"a\"]"));
    }

    #[test]
    fn test_builder_errors() {
        let columns_twice = Insert::into("A").columns(["a"]).columns(["b"]).build();
        assert!(matches!(columns_twice, Err(DbSetupError::InvalidState(_))));

        let wrong_size = Insert::into("A").columns(["a", "b"]).values([1]).build();
        assert!(matches!(wrong_size, Err(DbSetupError::InvalidArgument(_))));

        let generated_then_column = Insert::into("A")
            .with_default_value("a", 1)
            .columns(["a"])
            .build();
        assert!(matches!(generated_then_column, Err(DbSetupError::InvalidState(_))));

        let column_then_generated = Insert::into("A")
            .columns(["a"])
            .with_default_value("a", 1)
            .build();
        assert!(matches!(column_then_generated, Err(DbSetupError::InvalidArgument(_))));

        let unknown_binder = Insert::into("A").columns(["a"]).with_binder(Binder::Date, "b").build();
        assert!(matches!(unknown_binder, Err(DbSetupError::InvalidArgument(_))));

        let unknown_row_column = Insert::into("A").columns(["a"]).row().column("b", 1).end().build();
        assert!(matches!(unknown_row_column, Err(DbSetupError::InvalidArgument(_))));

        let empty = Insert::into("A").build();
        assert!(matches!(empty, Err(DbSetupError::InvalidState(_))));
    }

    #[test]
    fn test_first_error_is_kept() {
        let result = Insert::into("A")
            .columns(["a"])
            .values([1, 2])
            .columns(["b"])
            .build();
        match result {
            Err(DbSetupError::InvalidArgument(message)) => {
                assert!(message.contains("number of values"))
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_build_twice() {
        let mut builder = Insert::into("A");
        builder.columns(["a"]).values([1]);
        assert!(builder.build().is_ok());
        assert!(matches!(builder.build(), Err(DbSetupError::InvalidState(_))));
        builder.values([2]);
        assert!(matches!(builder.build(), Err(DbSetupError::InvalidState(_))));
    }
}
