//! Entry points of the DSL.

use std::sync::Arc;

use dbsetup_core::operation::insert;
use dbsetup_core::{BinderConfiguration, DbSetup, DbSetupResult, Insert, IntoDestination};

use crate::builder::DbSetupBuilder;

/// Build a [`DbSetup`] launched on `to`, with the default binder configuration.
///
/// ```ignore
/// let setup = db_setup(&pool, |s| {
///     s.delete_all_from(["user", "country"])
///         .insert_into("country", |b| {
///             b.columns(["id", "code"]).values((1, "FR")).values((2, "CI"));
///         });
/// })?;
/// setup.launch().await?;
/// ```
pub fn db_setup<F>(to: impl IntoDestination, configure: F) -> DbSetupResult<DbSetup>
where
    F: FnOnce(&mut DbSetupBuilder),
{
    let mut builder = DbSetupBuilder::new();
    builder.destination(to);
    configure(&mut builder);
    builder.build()
}

/// Build a [`DbSetup`] launched on `to`, with a custom binder configuration
pub fn db_setup_with<F>(
    to: impl IntoDestination,
    binder_configuration: Arc<dyn BinderConfiguration>,
    configure: F,
) -> DbSetupResult<DbSetup>
where
    F: FnOnce(&mut DbSetupBuilder),
{
    let mut builder = DbSetupBuilder::new();
    builder.destination(to).binder_configuration(binder_configuration);
    configure(&mut builder);
    builder.build()
}

/// Build an [`Insert`] outside of a setup, e.g. to reuse it or delete its rows later
pub fn insert_into<F>(table: impl Into<String>, configure: F) -> DbSetupResult<Insert>
where
    F: FnOnce(&mut insert::Builder),
{
    let mut builder = Insert::into(table);
    configure(&mut builder);
    builder.build()
}
