//! Value generators
//!
//! Generators fill a column for every row of an insert without listing the
//! value in each row: ids from a sequence, codes like `CODE_001`, or dates one
//! day apart.

use chrono::{DateTime, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;

use crate::bind::{parse_date, parse_timestamp, MIN_TIMESTAMP_LENGTH};
use crate::error::{DbSetupError, DbSetupResult};
use crate::value::Value;

/// Produces the values of a generated column, one per inserted row
pub trait ValueGenerator: fmt::Debug + Send {
    /// Return the next value of the sequence
    fn next_value(&mut self) -> Value;
}

/// A generator returning a numeric sequence starting at 1, incrementing by 1
pub fn sequence() -> SequenceValueGenerator {
    SequenceValueGenerator::default()
}

/// A generator returning `prefix` followed by a sequence number starting at 1
pub fn string_sequence(prefix: impl Into<String>) -> StringSequenceValueGenerator {
    StringSequenceValueGenerator::new(prefix)
}

/// A generator returning timestamps starting today at midnight, one day apart
pub fn date_sequence() -> DateSequenceValueGenerator {
    DateSequenceValueGenerator::default()
}

/// A generator always returning the same value
pub fn constant(value: impl Into<Value>) -> ConstantValueGenerator {
    ConstantValueGenerator(value.into())
}

// =============================================================================
// Numeric sequence
// =============================================================================

/// BIGINT sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceValueGenerator {
    next: i64,
    increment: i32,
}

impl Default for SequenceValueGenerator {
    fn default() -> Self {
        Self { next: 1, increment: 1 }
    }
}

impl SequenceValueGenerator {
    /// Restart the sequence at `start`
    pub fn starting_at(mut self, start: i64) -> Self {
        self.next = start;
        self
    }

    /// Change the increment between two values
    pub fn incrementing_by(mut self, increment: i32) -> Self {
        self.increment = increment;
        self
    }

    /// Restart an in-use sequence at `start`
    pub fn restart_at(&mut self, start: i64) {
        self.next = start;
    }
}

impl ValueGenerator for SequenceValueGenerator {
    fn next_value(&mut self) -> Value {
        let result = self.next;
        self.next = self.next.wrapping_add(i64::from(self.increment));
        Value::BigInt(result)
    }
}

// =============================================================================
// String sequence
// =============================================================================

/// Text sequence: a prefix followed by an optionally zero-padded number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSequenceValueGenerator {
    prefix: String,
    next: i64,
    increment: i32,
    padded_number_length: usize,
}

impl StringSequenceValueGenerator {
    fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            increment: 1,
            padded_number_length: 0,
        }
    }

    /// Left-pad the number with zeros up to `padded_number_length` digits.
    ///
    /// # Errors
    /// Returns `DbSetupError::InvalidArgument` if the length is 0.
    pub fn with_left_padding(mut self, padded_number_length: usize) -> DbSetupResult<Self> {
        if padded_number_length == 0 {
            return Err(DbSetupError::invalid_argument("padded number length must be > 0"));
        }
        self.padded_number_length = padded_number_length;
        Ok(self)
    }

    /// Remove left padding
    pub fn without_left_padding(mut self) -> Self {
        self.padded_number_length = 0;
        self
    }

    /// Restart the sequence at `start`
    pub fn starting_at(mut self, start: i64) -> Self {
        self.next = start;
        self
    }

    /// Change the increment between two numbers
    pub fn incrementing_by(mut self, increment: i32) -> Self {
        self.increment = increment;
        self
    }

    /// Restart an in-use sequence at `start`
    pub fn restart_at(&mut self, start: i64) {
        self.next = start;
    }

    fn next_string(&mut self) -> String {
        let number = self.next;
        self.next = self.next.wrapping_add(i64::from(self.increment));
        format!("{}{:0width$}", self.prefix, number, width = self.padded_number_length)
    }
}

impl ValueGenerator for StringSequenceValueGenerator {
    fn next_value(&mut self) -> Value {
        Value::Text(self.next_string())
    }
}

// =============================================================================
// Date sequence
// =============================================================================

/// Unit of the increment of a date sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// TIMESTAMP sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSequenceValueGenerator {
    next: NaiveDateTime,
    increment: i32,
    unit: DateUnit,
}

impl Default for DateSequenceValueGenerator {
    fn default() -> Self {
        Self {
            next: Local::now().date_naive().and_time(NaiveTime::MIN),
            increment: 1,
            unit: DateUnit::Day,
        }
    }
}

impl DateSequenceValueGenerator {
    /// Start the sequence at the given timestamp
    pub fn starting_at(mut self, start: NaiveDateTime) -> Self {
        self.next = start;
        self
    }

    /// Start the sequence at midnight of the given date
    pub fn starting_at_date(self, start: NaiveDate) -> Self {
        self.starting_at(start.and_time(NaiveTime::MIN))
    }

    /// Start the sequence at the given instant, expressed in UTC
    pub fn starting_at_zoned<Tz: TimeZone>(self, start: DateTime<Tz>) -> Self {
        self.starting_at(start.naive_utc())
    }

    /// Start the sequence at `yyyy-mm-dd hh:mm:ss[.f]` or `yyyy-mm-dd`.
    ///
    /// # Errors
    /// Returns `DbSetupError::Conversion` if the string cannot be parsed.
    pub fn starting_at_str(self, start: &str) -> DbSetupResult<Self> {
        let start = if start.trim().len() >= MIN_TIMESTAMP_LENGTH {
            parse_timestamp(start)?
        } else {
            parse_date(start)?.and_time(NaiveTime::MIN)
        };
        Ok(self.starting_at(start))
    }

    /// Change the increment between two timestamps
    pub fn incrementing_by(mut self, increment: i32, unit: DateUnit) -> Self {
        self.increment = increment;
        self.unit = unit;
        self
    }

    /// Restart an in-use sequence at `start`
    pub fn restart_at(&mut self, start: NaiveDateTime) {
        self.next = start;
    }

    fn advance(&self, from: NaiveDateTime) -> NaiveDateTime {
        let n = i64::from(self.increment);
        let advanced = match self.unit {
            DateUnit::Year => add_months(from, n * 12),
            DateUnit::Month => add_months(from, n),
            DateUnit::Day => from.checked_add_signed(Duration::days(n)),
            DateUnit::Hour => from.checked_add_signed(Duration::hours(n)),
            DateUnit::Minute => from.checked_add_signed(Duration::minutes(n)),
            DateUnit::Second => from.checked_add_signed(Duration::seconds(n)),
            DateUnit::Millisecond => from.checked_add_signed(Duration::milliseconds(n)),
        };
        // Past the representable range the sequence stays on its last value.
        advanced.unwrap_or(from)
    }
}

fn add_months(from: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        from.checked_add_months(magnitude)
    } else {
        from.checked_sub_months(magnitude)
    }
}

impl ValueGenerator for DateSequenceValueGenerator {
    fn next_value(&mut self) -> Value {
        let result = self.next;
        self.next = self.advance(result);
        Value::Timestamp(result)
    }
}

// =============================================================================
// Constant
// =============================================================================

/// Generator returning the same value for every row
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantValueGenerator(Value);

impl ValueGenerator for ConstantValueGenerator {
    fn next_value(&mut self) -> Value {
        self.0.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
