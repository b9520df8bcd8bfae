//! DbSetup Core
//!
//! Populates a database before tests: a [`DbSetup`] executes an [`Operation`]
//! (inserts, deletes, truncations, raw statements) on a [`Destination`] in a
//! single transaction.
//!
//! # Architecture
//!
//! ```text
//! Operation → DbSetup → Destination → Connection (begin, execute, commit)
//!                 ↑
//!          DbSetupTracker (skips relaunching after read-only tests)
//! ```
//!
//! # Components
//!
//! - **Values and binders**: dynamically typed row values, converted to the
//!   column type before binding
//! - **Generators**: sequences, dates and constants for generated columns
//! - **Operations**: insert, delete, truncate, SQL, sequences
//! - **Destinations**: PostgreSQL (feature `postgres`) and a recording stub
//!
//! # Usage
//!
//! ```rust
//! use dbsetup_core::stub::RecordingDestination;
//! use dbsetup_core::{delete_all_from, insert_into, sequence_of, DbSetup, DbSetupResult};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> DbSetupResult<()> {
//!     let destination = Arc::new(RecordingDestination::new());
//!
//!     let operation = sequence_of([
//!         delete_all_from("VENDOR"),
//!         insert_into("VENDOR")
//!             .columns(["ID", "NAME"])
//!             .values((1, "AMAZON"))
//!             .build()?
//!             .into(),
//!     ]);
//!     DbSetup::new(&destination, operation).launch().await?;
//!
//!     assert_eq!(destination.connection_handle().statements().len(), 2);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod bind;
pub mod config;
pub mod destination;
pub mod error;
pub mod generator;
pub mod operation;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod setup;
pub mod stub;
pub mod value;

// Re-exports for convenience
pub use bind::{
    Binder, BinderConfiguration, DefaultBinderConfiguration, DisabledBinderConfiguration,
    ParameterMetadata, SqlType,
};
pub use config::DbSetupConfig;
pub use destination::{BoundParameter, Connection, Destination, IntoDestination};
pub use error::{DbSetupError, DbSetupResult};
pub use generator::ValueGenerator;
pub use operation::{
    delete_all_from, delete_from, insert_into, sequence_of, sql, truncate, CompositeOperation,
    CustomOperation, Delete, DeleteAll, Executable, Insert, Operation, SqlOperation, Truncate,
};
#[cfg(feature = "postgres")]
pub use postgres::{PgPoolDestination, PgSession, PgUrlDestination};
pub use setup::{DbSetup, DbSetupTracker};
pub use value::{IntoNames, IntoValues, Value};
