//! Launching operations
//!
//! A [`DbSetup`] ties an operation to a destination and executes it in a
//! single transaction. A [`DbSetupTracker`] avoids relaunching a setup when
//! the previous test declared that it didn't modify the database.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bind::{BinderConfiguration, DefaultBinderConfiguration};
use crate::destination::{Connection, Destination, IntoDestination};
use crate::error::DbSetupResult;
use crate::operation::{Executable, Operation};

// =============================================================================
// DbSetup
// =============================================================================

/// An operation to execute on a destination
#[derive(Debug, Clone)]
pub struct DbSetup {
    destination: Arc<dyn Destination>,
    operation: Operation,
    binder_configuration: Arc<dyn BinderConfiguration>,
}

impl DbSetup {
    /// Create a setup using the shared default binder configuration
    pub fn new(destination: impl IntoDestination, operation: impl Into<Operation>) -> Self {
        Self::with_binder_configuration(destination, operation, DefaultBinderConfiguration::shared())
    }

    /// Create a setup using a custom binder configuration
    pub fn with_binder_configuration(
        destination: impl IntoDestination,
        operation: impl Into<Operation>,
        binder_configuration: Arc<dyn BinderConfiguration>,
    ) -> Self {
        Self {
            destination: destination.into_destination(),
            operation: operation.into(),
            binder_configuration,
        }
    }

    /// The executed operation
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The destination connections are obtained from
    pub fn destination(&self) -> &Arc<dyn Destination> {
        &self.destination
    }

    /// The binder configuration used by inserts
    pub fn binder_configuration(&self) -> &Arc<dyn BinderConfiguration> {
        &self.binder_configuration
    }

    /// Execute the operation in a transaction on a connection from the destination.
    ///
    /// # Errors
    /// Returns the error of the connection, of the operation, or of the
    /// commit. The transaction is rolled back on operation and commit errors.
    pub async fn launch(&self) -> DbSetupResult<()> {
        let mut connection = self.destination.connection().await?;
        self.launch_on(connection.as_mut()).await
    }

    /// Execute the operation in a transaction on a caller-owned connection
    pub async fn launch_on(&self, connection: &mut dyn Connection) -> DbSetupResult<()> {
        info!(operation = %self.operation, "Launching database setup");

        connection.begin().await?;
        let result = match self
            .operation
            .execute(connection, self.binder_configuration.as_ref())
            .await
        {
            Ok(()) => connection.commit().await,
            Err(e) => Err(e),
        };

        if let Err(error) = result {
            if let Err(rollback_error) = connection.rollback().await {
                warn!(error = %rollback_error, "Rollback failed after setup error");
            }
            return Err(error);
        }

        info!("Database setup committed");
        Ok(())
    }
}

/// Equal when the operations are equal and the destination and binder
/// configuration are the same instances
impl PartialEq for DbSetup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.destination, &other.destination)
            && Arc::ptr_eq(&self.binder_configuration, &other.binder_configuration)
            && self.operation == other.operation
    }
}

// =============================================================================
// DbSetupTracker
// =============================================================================

/// Skips relaunching a setup that was just launched when the previous test
/// only read the database.
///
/// Typical usage, in a test fixture:
///
/// ```ignore
/// tracker.launch_if_necessary(&setup).await?;
/// // read-only test...
/// tracker.ignore_next_launch();
/// ```
#[derive(Debug, Default)]
pub struct DbSetupTracker {
    last_setup_launched: Option<DbSetup>,
    next_launch_skippable: bool,
}

impl DbSetupTracker {
    /// Create a tracker that has launched nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch `setup` unless [`ignore_next_launch`](Self::ignore_next_launch)
    /// was called since the previous call and `setup` equals the last setup
    /// launched
    pub async fn launch_if_necessary(&mut self, setup: &DbSetup) -> DbSetupResult<()> {
        let skip = self.next_launch_skippable && self.last_setup_launched.as_ref() == Some(setup);
        self.next_launch_skippable = false;
        if skip {
            debug!("Skipping launch of unchanged database setup");
            return Ok(());
        }

        setup.launch().await?;
        self.last_setup_launched = Some(setup.clone());
        Ok(())
    }

    /// Let the next launch of the same setup be skipped
    pub fn ignore_next_launch(&mut self) {
        self.next_launch_skippable = true;
    }
}

// =============================================================================
// Tests
// =============================================================================
