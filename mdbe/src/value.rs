//!
//! Value Types
//!
//! `Value` is what the decode path hands back when the caller asks for a
//! column's natural value. `HostValue` is the closed set of host value
//! categories the binding encoder accepts. Textual forms of temporal values
//! follow fixed patterns shared by both directions.
//!

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::HostClass;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| Error::parse(text, "date"))
}

pub fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, TIME_FORMAT).map_err(|_| Error::parse(text, "time"))
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| Error::parse(text, "timestamp"))
}

/// Accepts `true`/`false`, `t`/`f` and `1`/`0`, ignoring case.
pub fn parse_bool(text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(Error::parse(text, "boolean")),
    }
}

/// Renders an unscaled integer with `scale` fractional digits. Works for
/// the full 128-bit range, beyond what `Decimal` can hold.
pub fn format_unscaled(unscaled: i128, scale: u32) -> String {
    let digits = unscaled.unsigned_abs().to_string();
    let sign = if unscaled < 0 { "-" } else { "" };
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    HugeInt(i128),
    Decimal(Decimal),
    Real(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::HugeInt(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&hex::encode(v)),
            Value::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Value::Time(v) => write!(f, "{}", v.format(TIME_FORMAT)),
            Value::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_FORMAT)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(v) => write!(f, "{}", v),
            Number::I16(v) => write!(f, "{}", v),
            Number::I32(v) => write!(f, "{}", v),
            Number::I64(v) => write!(f, "{}", v),
            Number::F32(v) => write!(f, "{}", v),
            Number::F64(v) => write!(f, "{}", v),
            Number::Decimal(v) => write!(f, "{}", v),
        }
    }
}

/// Host values accepted by the binding encoder, one variant per value
/// category.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Text(String),
    Number(Number),
    Bool(bool),
    BigInt(i128),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Blob(Vec<u8>),
    Uri(String),
}

impl HostValue {
    /// Host class used to pick a target type when none is declared. `None`
    /// for a null.
    pub fn class(&self) -> Option<HostClass> {
        let class = match self {
            HostValue::Null => return None,
            HostValue::Text(_) | HostValue::Uri(_) => HostClass::Text,
            HostValue::Number(Number::I8(_)) | HostValue::Number(Number::I16(_)) => HostClass::I16,
            HostValue::Number(Number::I32(_)) => HostClass::I32,
            HostValue::Number(Number::I64(_)) => HostClass::I64,
            HostValue::Number(Number::F32(_)) => HostClass::F32,
            HostValue::Number(Number::F64(_)) => HostClass::F64,
            HostValue::Number(Number::Decimal(_)) => HostClass::Decimal,
            HostValue::Bool(_) => HostClass::Bool,
            HostValue::BigInt(_) => HostClass::BigInt,
            HostValue::Bytes(_) => HostClass::Bytes,
            HostValue::Blob(_) => HostClass::Blob,
            HostValue::Date(_) => HostClass::Date,
            HostValue::Time(_) => HostClass::Time,
            HostValue::Timestamp(_) => HostClass::Timestamp,
        };
        Some(class)
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Text(_) => "text",
            HostValue::Number(_) => "number",
            HostValue::Bool(_) => "bool",
            HostValue::BigInt(_) => "big integer",
            HostValue::Bytes(_) => "bytes",
            HostValue::Date(_) => "date",
            HostValue::Time(_) => "time",
            HostValue::Timestamp(_) => "timestamp",
            HostValue::Blob(_) => "blob",
            HostValue::Uri(_) => "uri",
        }
    }
}

macro_rules! host_number {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                fn from(v: $ty) -> Self {
                    HostValue::Number(Number::$variant(v))
                }
            }
        )*
    };
}

host_number!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal
);

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Bool(v)
    }
}

impl From<i128> for HostValue {
    fn from(v: i128) -> Self {
        HostValue::BigInt(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::Text(v.to_string())
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        HostValue::Text(v)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(v: Vec<u8>) -> Self {
        HostValue::Bytes(v)
    }
}

impl From<&[u8]> for HostValue {
    fn from(v: &[u8]) -> Self {
        HostValue::Bytes(v.to_vec())
    }
}

impl From<NaiveDate> for HostValue {
    fn from(v: NaiveDate) -> Self {
        HostValue::Date(v)
    }
}

impl From<NaiveTime> for HostValue {
    fn from(v: NaiveTime) -> Self {
        HostValue::Time(v)
    }
}

impl From<NaiveDateTime> for HostValue {
    fn from(v: NaiveDateTime) -> Self {
        HostValue::Timestamp(v)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(HostValue::Null, Into::into)
    }
}

/// Borrowed view of one blob cell. Lives no longer than the cursor it was
/// read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// `len` bytes starting at the 1-based `position`, truncated at the end
    /// of the blob.
    pub fn get_bytes(&self, position: usize, len: usize) -> Result<&'a [u8]> {
        if position == 0 || position > self.data.len() + 1 {
            return Err(Error::Range {
                what: "blob position",
                index: position as i64,
                count: self.data.len(),
            });
        }
        let start = position - 1;
        let end = start.saturating_add(len).min(self.data.len());
        Ok(&self.data[start..end])
    }

    /// 1-based offset of the first occurrence of `pattern` at or after
    /// `start`.
    pub fn position(&self, pattern: &[u8], start: usize) -> Option<usize> {
        if pattern.is_empty() || start == 0 {
            return None;
        }
        self.data
            .get(start - 1..)?
            .windows(pattern.len())
            .position(|w| w == pattern)
            .map(|i| i + start)
    }
}
