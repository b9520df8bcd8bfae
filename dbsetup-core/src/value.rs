//! Values written by fixture operations
//!
//! Fixture rows are heterogeneous: the same insert mixes ids, names, dates and
//! nulls. [`Value`] carries any of them until a [`Binder`](crate::bind::Binder)
//! turns it into what the column expects.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed SQL value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL NULL
    #[default]
    Null,
    /// BOOLEAN
    Bool(bool),
    /// SMALLINT
    SmallInt(i16),
    /// INTEGER
    Int(i32),
    /// BIGINT
    BigInt(i64),
    /// REAL
    Real(f32),
    /// DOUBLE PRECISION
    Double(f64),
    /// NUMERIC / DECIMAL
    Decimal(Decimal),
    /// Any character type
    Text(String),
    /// DATE
    Date(NaiveDate),
    /// TIME
    Time(NaiveTime),
    /// TIMESTAMP (without time zone)
    Timestamp(NaiveDateTime),
    /// TIMESTAMP WITH TIME ZONE
    TimestampTz(DateTime<Utc>),
    /// UUID
    Uuid(Uuid),
    /// JSON / JSONB
    Json(serde_json::Value),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Whether this value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render the value as a SQL literal.
    ///
    /// Numbers and booleans are written bare, everything else is quoted with
    /// embedded single quotes doubled.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::SmallInt(n) => n.to_string(),
            Value::Int(n) => n.to_string(),
            Value::BigInt(n) => n.to_string(),
            Value::Real(n) => n.to_string(),
            Value::Double(n) => n.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                format!("'\\x{}'", hex)
            },
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::SmallInt(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::BigInt(n) => write!(f, "{}", n),
            Value::Real(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::TimestampTz(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Json(j) => write!(f, "{}", j),
            Value::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Real,
    f64 => Double,
    Decimal => Decimal,
    String => Text,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => Uuid,
    serde_json::Value => Json,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::BigInt(i64::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Conversion of a heterogeneous row into values.
///
/// Implemented for tuples (up to 12 elements), arrays, vectors and slices, so
/// that `values((1, "John", None::<i32>))` and `values(["a", "b"])` both work.
pub trait IntoValues {
    /// Convert into the list of values of one row
    fn into_values(self) -> Vec<Value>;
}

impl IntoValues for Vec<Value> {
    fn into_values(self) -> Vec<Value> {
        self
    }
}

impl<T: Into<Value>, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Value> + Clone> IntoValues for &[T] {
    fn into_values(self) -> Vec<Value> {
        self.iter().cloned().map(Into::into).collect()
    }
}

macro_rules! impl_into_values_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> IntoValues for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_values_for_tuple!(A);
impl_into_values_for_tuple!(A, B);
impl_into_values_for_tuple!(A, B, C);
impl_into_values_for_tuple!(A, B, C, D);
impl_into_values_for_tuple!(A, B, C, D, E);
impl_into_values_for_tuple!(A, B, C, D, E, F);
impl_into_values_for_tuple!(A, B, C, D, E, F, G);
impl_into_values_for_tuple!(A, B, C, D, E, F, G, H);
impl_into_values_for_tuple!(A, B, C, D, E, F, G, H, I);
impl_into_values_for_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_into_values_for_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_into_values_for_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Names
// =============================================================================

/// One name or a list of names (tables, columns, statements).
pub trait IntoNames {
    /// Convert into an ordered list of names
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<T: Into<String>, const N: usize> IntoNames for [T; N] {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<String>> IntoNames for Vec<T> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: AsRef<str>> IntoNames for &[T] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(1), Value::Int(1));
        assert_eq!(Value::from(1_i64), Value::BigInt(1));
        assert_eq!(Value::from("John"), Value::Text("John".to_string()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
        assert_eq!(Value::from(dec!(1.50)), Value::Decimal(dec!(1.50)));
    }

    #[test]
    fn test_sql_literal() {
        assert_eq!(Value::Null.to_sql_literal(), "null");
        assert_eq!(Value::BigInt(42).to_sql_literal(), "42");
        assert_eq!(Value::Bool(true).to_sql_literal(), "true");
        assert_eq!(Value::from("O'Brien").to_sql_literal(), "'O''Brien'");

        let date = NaiveDate::from_ymd_opt(2013, 7, 19).unwrap();
        assert_eq!(Value::Date(date).to_sql_literal(), "'2013-07-19'");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_sql_literal(), "'\\xdead'");
    }

    #[test]
    fn test_display_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2013, 7, 19)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2013-07-19 10:30:00");
    }

    #[test]
    fn test_tuple_into_values() {
        let row = (1, "John", None::<&str>).into_values();
        assert_eq!(
            row,
            vec![Value::Int(1), Value::Text("John".to_string()), Value::Null]
        );
    }

    #[test]
    fn test_into_names() {
        assert_eq!("user".into_names(), vec!["user"]);
        assert_eq!(["country", "user"].into_names(), vec!["country", "user"]);
        assert_eq!(
            vec!["a".to_string(), "b".to_string()].into_names(),
            vec!["a", "b"]
        );
        let empty: Vec<String> = Vec::new();
        assert!(empty.into_names().is_empty());
    }
}
