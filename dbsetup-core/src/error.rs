//! DbSetup error types

use thiserror::Error;

/// Errors raised while building or launching a database setup
#[derive(Debug, Error)]
pub enum DbSetupError {
    /// A builder was used in a way its current state does not allow
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An argument was rejected (unknown column, mismatched row size, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A binder could not convert a value to the type of its column
    #[error("Cannot convert {value} to {target}: {reason}")]
    Conversion {
        /// The value as written in the fixture
        value: String,
        /// The targeted SQL type
        target: &'static str,
        /// Parser message
        reason: String,
    },

    /// A statement failed on the database
    #[error("Database error: {0}")]
    Database(String),

    /// Obtaining or using a connection failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection does not support the requested feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl DbSetupError {
    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn conversion(
        value: impl ToString,
        target: &'static str,
        reason: impl ToString,
    ) -> Self {
        Self::Conversion {
            value: value.to_string(),
            target,
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for DbSetupError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => DbSetupError::Config(e.to_string()),
            sqlx::Error::Io(e) => DbSetupError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => DbSetupError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                DbSetupError::Connection("timed out waiting for a pooled connection".to_string())
            },
            sqlx::Error::PoolClosed => DbSetupError::Connection("pool is closed".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code() {
                Some(code) => DbSetupError::Database(format!("{} (SQLSTATE {})", db_err, code)),
                None => DbSetupError::Database(db_err.to_string()),
            },
            _ => DbSetupError::Database(err.to_string()),
        }
    }
}

/// Result type for DbSetup operations
pub type DbSetupResult<T> = Result<T, DbSetupError>;
