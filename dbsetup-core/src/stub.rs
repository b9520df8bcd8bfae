//! Stub implementations for testing.
//!
//! [`RecordingConnection`] records every call instead of talking to a
//! database, and [`RecordingDestination`] hands out connections sharing the
//! same record.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::bind::{ParameterMetadata, SqlType};
use crate::destination::{BoundParameter, Connection, Destination};
use crate::error::{DbSetupError, DbSetupResult};

/// A recorded connection call
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Begin,
    Commit,
    Rollback,
    /// A statement without parameters
    Execute(String),
    /// A prepared statement with its parameters
    Prepared {
        sql: String,
        params: Vec<BoundParameter>,
    },
}

#[derive(Debug)]
struct StubState {
    recorded: Vec<Recorded>,
    /// Statements containing one of these fragments fail
    fail_on: Vec<String>,
    fail_begin: bool,
    fail_commit: bool,
    fail_rollback: bool,
    column_types: HashMap<(String, String), SqlType>,
    metadata_supported: bool,
    metadata_requests: usize,
    numbered_placeholders: bool,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            recorded: Vec::new(),
            fail_on: Vec::new(),
            fail_begin: false,
            fail_commit: false,
            fail_rollback: false,
            column_types: HashMap::new(),
            metadata_supported: true,
            metadata_requests: 0,
            numbered_placeholders: false,
        }
    }
}

// =============================================================================
// Recording Connection
// =============================================================================

/// Connection recording every call.
///
/// Clones share the same record and configuration.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnection {
    state: Arc<RwLock<StubState>>,
}

impl RecordingConnection {
    /// Create a connection with an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Make statements containing `fragment` fail
    pub fn fail_on(&self, fragment: impl Into<String>) {
        self.state.write().unwrap().fail_on.push(fragment.into());
    }

    /// Make `begin` fail
    pub fn set_fail_begin(&self, fail: bool) {
        self.state.write().unwrap().fail_begin = fail;
    }

    /// Make `commit` fail
    pub fn set_fail_commit(&self, fail: bool) {
        self.state.write().unwrap().fail_commit = fail;
    }

    /// Make `rollback` fail
    pub fn set_fail_rollback(&self, fail: bool) {
        self.state.write().unwrap().fail_rollback = fail;
    }

    /// Declare the SQL type reported by metadata for a column
    pub fn set_column_type(&self, table: &str, column: &str, sql_type: SqlType) {
        self.state
            .write()
            .unwrap()
            .column_types
            .insert((table.to_lowercase(), column.to_lowercase()), sql_type);
    }

    /// When unsupported, metadata requests fail
    pub fn set_metadata_supported(&self, supported: bool) {
        self.state.write().unwrap().metadata_supported = supported;
    }

    /// Use `$1, $2, ...` placeholders instead of `?`
    pub fn use_numbered_placeholders(&self) {
        self.state.write().unwrap().numbered_placeholders = true;
    }

    /// Every recorded call, in order
    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.read().unwrap().recorded.clone()
    }

    /// The executed statements, prepared or not
    pub fn statements(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .recorded
            .iter()
            .filter_map(|call| match call {
                Recorded::Execute(sql) | Recorded::Prepared { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// The parameters of each prepared statement execution
    pub fn prepared_params(&self) -> Vec<Vec<BoundParameter>> {
        self.state
            .read()
            .unwrap()
            .recorded
            .iter()
            .filter_map(|call| match call {
                Recorded::Prepared { params, .. } => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of parameter metadata requests
    pub fn metadata_requests(&self) -> usize {
        self.state.read().unwrap().metadata_requests
    }

    /// Forget recorded calls, keeping the configuration
    pub fn clear(&self) {
        self.state.write().unwrap().recorded.clear();
    }

    fn check_statement(&self, sql: &str) -> DbSetupResult<()> {
        let state = self.state.read().unwrap();
        if state.fail_on.iter().any(|fragment| sql.contains(fragment.as_str())) {
            return Err(DbSetupError::Database(format!("Simulated failure of: {}", sql)));
        }
        Ok(())
    }

    fn record(&self, call: Recorded) {
        self.state.write().unwrap().recorded.push(call);
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn begin(&mut self) -> DbSetupResult<()> {
        if self.state.read().unwrap().fail_begin {
            return Err(DbSetupError::Connection("Simulated begin failure".to_string()));
        }
        self.record(Recorded::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> DbSetupResult<()> {
        if self.state.read().unwrap().fail_commit {
            return Err(DbSetupError::Database("Simulated commit failure".to_string()));
        }
        self.record(Recorded::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> DbSetupResult<()> {
        if self.state.read().unwrap().fail_rollback {
            return Err(DbSetupError::Database("Simulated rollback failure".to_string()));
        }
        self.record(Recorded::Rollback);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> DbSetupResult<u64> {
        self.check_statement(sql)?;
        self.record(Recorded::Execute(sql.to_string()));
        Ok(0)
    }

    async fn execute_prepared(&mut self, sql: &str, params: &[BoundParameter]) -> DbSetupResult<u64> {
        self.check_statement(sql)?;
        self.record(Recorded::Prepared {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(1)
    }

    async fn parameter_metadata(
        &mut self,
        table: &str,
        columns: &[String],
    ) -> DbSetupResult<ParameterMetadata> {
        let mut state = self.state.write().unwrap();
        state.metadata_requests += 1;
        if !state.metadata_supported {
            return Err(DbSetupError::Unsupported("parameter metadata".to_string()));
        }
        let table = table.to_lowercase();
        let types = columns
            .iter()
            .map(|column| {
                state
                    .column_types
                    .get(&(table.clone(), column.to_lowercase()))
                    .cloned()
            })
            .collect();
        Ok(ParameterMetadata::new(types))
    }

    fn placeholder(&self, position: usize) -> String {
        if self.state.read().unwrap().numbered_placeholders {
            format!("${}", position)
        } else {
            "?".to_string()
        }
    }
}

// =============================================================================
// Recording Destination
// =============================================================================

/// Destination handing out [`RecordingConnection`]s that share one record
#[derive(Debug, Default)]
pub struct RecordingDestination {
    connection: RecordingConnection,
    opened: RwLock<usize>,
    unavailable: RwLock<bool>,
}

impl RecordingDestination {
    /// Create a destination with an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared connection, to configure failures or inspect the record
    pub fn connection_handle(&self) -> &RecordingConnection {
        &self.connection
    }

    /// Number of connections handed out
    pub fn connections_opened(&self) -> usize {
        *self.opened.read().unwrap()
    }

    /// Make `connection()` fail
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap() = unavailable;
    }
}

#[async_trait]
impl Destination for RecordingDestination {
    async fn connection(&self) -> DbSetupResult<Box<dyn Connection>> {
        if *self.unavailable.read().unwrap() {
            return Err(DbSetupError::Connection("Simulated unavailable destination".to_string()));
        }
        *self.opened.write().unwrap() += 1;
        Ok(Box::new(self.connection.clone()))
    }
}
