//! DbSetup
//!
//! A fluent DSL to populate a database before each test, on top of
//! [`dbsetup_core`].
//!
//! # Usage
//!
//! ```rust
//! use dbsetup::stub::RecordingDestination;
//! use dbsetup::{db_setup, DbSetupResult, DbSetupTracker, LaunchWith};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> DbSetupResult<()> {
//!     let destination = Arc::new(RecordingDestination::new());
//!     let mut tracker = DbSetupTracker::new();
//!
//!     let setup = db_setup(&destination, |s| {
//!         s.delete_all_from(["vendor", "country"])
//!             .insert_into("country", |b| {
//!                 b.columns(["id", "code"]).values((1, "FR")).values((2, "CI"));
//!             })
//!             .insert_into("vendor", |b| {
//!                 b.row().column("id", 1).column("name", "Amazon").column("country_id", 1).end();
//!             });
//!     })?;
//!
//!     setup.launch_with(&mut tracker).await?;
//!
//!     // a read-only test doesn't require the next identical setup to run
//!     tracker.ignore_next_launch();
//!     setup.launch_with(&mut tracker).await?;
//!
//!     assert_eq!(destination.connections_opened(), 1);
//!     Ok(())
//! }
//! ```
//!
//! With the `postgres` feature, a `sqlx::PgPool` (or a shared
//! `PgPoolDestination`) can be passed as destination.

#![warn(clippy::all)]

mod builder;
mod functions;
mod launch;

pub use builder::DbSetupBuilder;
pub use functions::{db_setup, db_setup_with, insert_into};
pub use launch::LaunchWith;

// Re-exports of the core
pub use dbsetup_core::{
    bind, config, delete_all_from, delete_from, destination, error, generator, operation,
    sequence_of, setup, sql, stub, truncate, value, Binder, BinderConfiguration, BoundParameter,
    CompositeOperation, Connection, CustomOperation, DbSetup, DbSetupConfig, DbSetupError,
    DbSetupResult, DbSetupTracker, Delete, DeleteAll, DefaultBinderConfiguration, Destination,
    DisabledBinderConfiguration,
    Executable, Insert, IntoDestination, IntoNames, IntoValues, Operation, ParameterMetadata,
    SqlOperation, SqlType, Truncate, Value, ValueGenerator,
};
#[cfg(feature = "postgres")]
pub use dbsetup_core::{postgres, PgPoolDestination, PgSession, PgUrlDestination};
