//! Binders and binder configurations
//!
//! A [`Binder`] converts the raw value written in a fixture into the value
//! actually sent for a statement parameter, so that `"2013-07-19"` can be
//! inserted into a DATE column. The [`BinderConfiguration`] picks a binder for
//! each parameter, usually from the parameter metadata of the statement.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::{DbSetupError, DbSetupResult};
use crate::value::Value;

/// Number of characters in `yyyy-mm-dd hh:mm:ss`
pub(crate) const MIN_TIMESTAMP_LENGTH: usize = 19;

// =============================================================================
// SQL types
// =============================================================================

/// SQL type of a statement parameter, as reported by metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Date,
    Time,
    Timestamp,
    TimestampWithTimeZone,
    BigInt,
    Integer,
    SmallInt,
    TinyInt,
    Decimal,
    Numeric,
    Double,
    Float,
    Real,
    Varchar,
    Char,
    LongVarchar,
    NChar,
    NVarchar,
    LongNVarchar,
    Boolean,
    Uuid,
    Json,
    Binary,
    /// A type with no dedicated variant, by database name
    Other(String),
}

impl SqlType {
    /// Map a type name as found in `information_schema.columns.data_type`.
    pub fn from_database_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "date" => SqlType::Date,
            "time" | "time without time zone" | "time with time zone" => SqlType::Time,
            "timestamp" | "timestamp without time zone" => SqlType::Timestamp,
            "timestamptz" | "timestamp with time zone" => SqlType::TimestampWithTimeZone,
            "bigint" | "int8" => SqlType::BigInt,
            "integer" | "int" | "int4" => SqlType::Integer,
            "smallint" | "int2" => SqlType::SmallInt,
            "tinyint" => SqlType::TinyInt,
            "decimal" => SqlType::Decimal,
            "numeric" => SqlType::Numeric,
            "double precision" | "float8" | "double" => SqlType::Double,
            "float" => SqlType::Float,
            "real" | "float4" => SqlType::Real,
            "character varying" | "varchar" | "text" => SqlType::Varchar,
            "character" | "char" | "bpchar" => SqlType::Char,
            "nchar" => SqlType::NChar,
            "nvarchar" => SqlType::NVarchar,
            "boolean" | "bool" => SqlType::Boolean,
            "uuid" => SqlType::Uuid,
            "json" | "jsonb" => SqlType::Json,
            "bytea" => SqlType::Binary,
            other => SqlType::Other(other.to_string()),
        }
    }
}

/// Parameter types of a prepared statement, indexed from 0
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMetadata {
    types: Vec<Option<SqlType>>,
}

impl ParameterMetadata {
    /// Create metadata from the per-parameter types (None = unknown)
    pub fn new(types: Vec<Option<SqlType>>) -> Self {
        Self { types }
    }

    /// Type of the parameter at the given 0-based index, if known
    pub fn parameter_type(&self, param: usize) -> Option<&SqlType> {
        self.types.get(param).and_then(Option::as_ref)
    }

    /// Number of parameters described
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no parameter is described
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// =============================================================================
// Binders
// =============================================================================

/// Conversion applied to a value before it is bound to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binder {
    /// Binds the value as is
    Default,
    /// Binds everything but NULL as text
    String,
    /// Binds DATE values, parsing `yyyy-mm-dd` text
    Date,
    /// Binds TIMESTAMP values, parsing timestamp or date text
    Timestamp,
    /// Binds TIME values, parsing `hh:mm:ss` text
    Time,
    /// Binds DECIMAL values, parsing numeric text
    Decimal,
    /// Binds integer values, parsing integer text
    Integer,
}

impl Binder {
    /// Convert `value` into the value to send for the parameter.
    ///
    /// # Errors
    /// Returns `DbSetupError::Conversion` when text cannot be parsed.
    pub fn bind(&self, value: &Value) -> DbSetupResult<Value> {
        match self {
            Binder::Default => Ok(value.clone()),
            Binder::String => Ok(match value {
                Value::Text(_) | Value::Null => value.clone(),
                other => Value::Text(other.to_string()),
            }),
            Binder::Date => match value {
                Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
                Value::TimestampTz(ts) => Ok(Value::Date(ts.date_naive())),
                Value::Text(s) => parse_date(s).map(Value::Date),
                other => Ok(other.clone()),
            },
            Binder::Timestamp => match value {
                Value::Date(d) => Ok(Value::Timestamp(d.and_time(NaiveTime::MIN))),
                Value::Text(s) => parse_timestamp(s).map(Value::Timestamp),
                other => Ok(other.clone()),
            },
            Binder::Time => match value {
                Value::Timestamp(ts) => Ok(Value::Time(ts.time())),
                Value::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                    .map(Value::Time)
                    .map_err(|e| DbSetupError::conversion(s, "TIME", e)),
                other => Ok(other.clone()),
            },
            Binder::Decimal => match value {
                Value::Text(s) => Decimal::from_str(s.trim())
                    .or_else(|_| Decimal::from_scientific(s.trim()))
                    .map(Value::Decimal)
                    .map_err(|e| DbSetupError::conversion(s, "DECIMAL", e)),
                other => Ok(other.clone()),
            },
            Binder::Integer => match value {
                Value::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::BigInt)
                    .map_err(|e| DbSetupError::conversion(s, "BIGINT", e)),
                other => Ok(other.clone()),
            },
        }
    }
}

impl fmt::Display for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Binder::Default => "default",
            Binder::String => "string",
            Binder::Date => "date",
            Binder::Timestamp => "timestamp",
            Binder::Time => "time",
            Binder::Decimal => "decimal",
            Binder::Integer => "integer",
        };
        write!(f, "{} binder", name)
    }
}

pub(crate) fn parse_date(s: &str) -> DbSetupResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| DbSetupError::conversion(s, "DATE", e))
}

/// Parse `yyyy-mm-dd hh:mm:ss[.f]`, or a plain date at midnight when shorter.
pub(crate) fn parse_timestamp(s: &str) -> DbSetupResult<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.len() >= MIN_TIMESTAMP_LENGTH {
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(|e| DbSetupError::conversion(s, "TIMESTAMP", e))
    } else {
        parse_date(trimmed).map(|d| d.and_time(NaiveTime::MIN))
    }
}

// =============================================================================
// Binder configuration
// =============================================================================

/// Chooses the binder of each statement parameter
pub trait BinderConfiguration: fmt::Debug + Send + Sync {
    /// Binder for the parameter at the 0-based index `param`.
    ///
    /// `metadata` is None when metadata is disabled for the operation or not
    /// available from the connection.
    fn binder(&self, metadata: Option<&ParameterMetadata>, param: usize) -> DbSetupResult<Binder>;

    /// Whether inserts may ask the connection for parameter metadata
    fn metadata_enabled(&self) -> bool {
        true
    }
}

/// Picks the binder from the parameter SQL type, falling back to the default binder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultBinderConfiguration;

impl DefaultBinderConfiguration {
    /// The process-wide instance used when no configuration is given.
    ///
    /// Setups sharing it compare equal, which the tracker relies on.
    pub fn shared() -> Arc<dyn BinderConfiguration> {
        static SHARED: OnceLock<Arc<dyn BinderConfiguration>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(DefaultBinderConfiguration)).clone()
    }
}

impl BinderConfiguration for DefaultBinderConfiguration {
    fn binder(&self, metadata: Option<&ParameterMetadata>, param: usize) -> DbSetupResult<Binder> {
        let Some(sql_type) = metadata.and_then(|m| m.parameter_type(param)) else {
            return Ok(Binder::Default);
        };

        let binder = match sql_type {
            SqlType::Date => Binder::Date,
            SqlType::Time => Binder::Time,
            SqlType::Timestamp | SqlType::TimestampWithTimeZone => Binder::Timestamp,
            SqlType::BigInt | SqlType::Integer | SqlType::SmallInt | SqlType::TinyInt => {
                Binder::Integer
            },
            SqlType::Decimal
            | SqlType::Double
            | SqlType::Float
            | SqlType::Numeric
            | SqlType::Real => Binder::Decimal,
            SqlType::Varchar
            | SqlType::Char
            | SqlType::LongNVarchar
            | SqlType::LongVarchar
            | SqlType::NChar
            | SqlType::NVarchar => Binder::String,
            _ => Binder::Default,
        };
        Ok(binder)
    }
}

/// Configuration for setups where every insert column has an explicit binder.
///
/// Metadata is never requested, and a column without explicit binder fails
/// with `DbSetupError::Unsupported`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisabledBinderConfiguration;

impl BinderConfiguration for DisabledBinderConfiguration {
    fn binder(&self, _metadata: Option<&ParameterMetadata>, param: usize) -> DbSetupResult<Binder> {
        Err(DbSetupError::Unsupported(format!(
            "binder is disabled, parameter {} has no explicit binder",
            param
        )))
    }

    fn metadata_enabled(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
