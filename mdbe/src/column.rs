///
/// Column decoder.
///
/// A `Column` owns one materialized result column and decodes single cells
/// on request. Fixed-width codes keep the engine's packed little-endian
/// buffer untouched; variable-width codes keep one boxed value per row.
///
/// Every accessor takes a 0-based row, fails with a range error outside
/// `0..rows()`, and returns `Ok(None)` for SQL NULL. NULL is signalled by:
/// - an absent boxed value
/// - a set bit in the optional null mask of a fixed-width column
/// - a NaN in a floating point column
///
/// Requests for a shape other than the column's own go through a widening
/// and narrowing matrix: numeric codes convert numerically (narrowing that
/// would overflow is a coercion error), text is parsed, and temporal codes
/// project onto each other under a `TemporalFill` policy.
///

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::TemporalFill;
use crate::error::{Error, Result};
use crate::native::{NativeError, RawColumn, RawData, VarValue};
use crate::types::EngineType;
use crate::value::{
    format_unscaled, parse_bool, parse_date, parse_time, parse_timestamp, Blob, Value,
    DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT,
};

/// Number of fractional digits encoded by the engine's scale multiplier.
///
/// The engine reports a scaled column's scale as the double `10^s`. A value
/// of 1 or less (including the 0 sent for unscaled columns) means `s = 0`.
pub fn decimal_scale(stored: f64) -> u32 {
    if stored.is_finite() && stored > 1.0 {
        stored.log10().round() as u32
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Storage {
    Fixed {
        data: Vec<u8>,
        scale: u32,
        nulls: Option<Vec<bool>>,
    },
    Var(Vec<Option<VarValue>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    engine_type: EngineType,
    digits: u32,
    storage: Storage,
}

/// Borrowed decoded cell, before any conversion.
#[derive(Debug, Clone, Copy)]
enum Cell<'a> {
    Null,
    Bool(bool),
    Int { value: i128, scale: u32 },
    Real(f32),
    Double(f64),
    Text(&'a str),
    Bytes(&'a [u8]),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Cell<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Bool(_) => "bool",
            Cell::Int { scale: 0, .. } => "integer",
            Cell::Int { .. } => "decimal",
            Cell::Real(_) => "f32",
            Cell::Double(_) => "f64",
            Cell::Text(_) => "text",
            Cell::Bytes(_) => "blob",
            Cell::Date(_) => "date",
            Cell::Time(_) => "time",
            Cell::Timestamp(_) => "timestamp",
        }
    }
}

fn malformed(message: String) -> Error {
    Error::Boundary(NativeError::new(message))
}

fn read<const N: usize>(data: &[u8], row: usize) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&data[row * N..row * N + N]);
    buf
}

/// The 16-byte little-endian cell is copied in reverse into a big-endian
/// buffer before conversion.
fn read_i128(data: &[u8], row: usize) -> i128 {
    let offset = row * 16;
    let mut big_endian = [0u8; 16];
    for (i, byte) in data[offset..offset + 16].iter().enumerate() {
        big_endian[15 - i] = *byte;
    }
    i128::from_be_bytes(big_endian)
}

fn pow10(scale: u32) -> Option<i128> {
    10i128.checked_pow(scale)
}

fn epoch_date() -> NaiveDate {
    // 1970-01-01
    NaiveDate::default()
}

impl Column {
    pub fn fixed(
        name: impl Into<String>,
        engine_type: EngineType,
        data: Vec<u8>,
        stored_scale: f64,
    ) -> Result<Self> {
        let name = name.into();
        let width = engine_type.byte_width().ok_or_else(|| {
            malformed(format!(
                "column '{}': {} is not a fixed-width type",
                name, engine_type
            ))
        })?;
        if data.len() % width != 0 {
            return Err(malformed(format!(
                "column '{}': {} bytes is not a multiple of {}",
                name,
                data.len(),
                width
            )));
        }
        let scale = if engine_type.is_integer() {
            decimal_scale(stored_scale)
        } else {
            0
        };
        Ok(Self {
            name,
            engine_type,
            digits: 0,
            storage: Storage::Fixed {
                data,
                scale,
                nulls: None,
            },
        })
    }

    pub fn with_nulls(mut self, mask: Vec<bool>) -> Result<Self> {
        let rows = self.rows();
        match &mut self.storage {
            Storage::Fixed { nulls, .. } if mask.len() == rows => *nulls = Some(mask),
            Storage::Fixed { .. } => {
                return Err(malformed(format!(
                    "column '{}': null mask has {} entries for {} rows",
                    self.name,
                    mask.len(),
                    rows
                )));
            }
            Storage::Var(_) => {
                return Err(malformed(format!(
                    "column '{}': null masks apply to fixed-width columns only",
                    self.name
                )));
            }
        }
        Ok(self)
    }

    pub fn variable(
        name: impl Into<String>,
        engine_type: EngineType,
        values: Vec<Option<VarValue>>,
    ) -> Result<Self> {
        let name = name.into();
        if engine_type.is_fixed_width() {
            return Err(malformed(format!(
                "column '{}': {} is not a variable-width type",
                name, engine_type
            )));
        }
        for value in values.iter().flatten() {
            let fits = matches!(
                (engine_type, value),
                (EngineType::Str, VarValue::Text(_))
                    | (EngineType::Blob, VarValue::Blob(_))
                    | (EngineType::Date, VarValue::Text(_) | VarValue::Date(_))
                    | (EngineType::Time, VarValue::Text(_) | VarValue::Time(_))
                    | (
                        EngineType::Timestamp,
                        VarValue::Text(_) | VarValue::Timestamp(_)
                    )
            );
            if !fits {
                return Err(malformed(format!(
                    "column '{}': unexpected {:?} value for {}",
                    name, value, engine_type
                )));
            }
        }
        Ok(Self {
            name,
            engine_type,
            digits: 0,
            storage: Storage::Var(values),
        })
    }

    /// Validates one column of a bulk transfer against its declared code and
    /// the result's row count.
    pub fn from_raw(raw: RawColumn, rows: usize) -> Result<Self> {
        let engine_type = EngineType::from_code(raw.code).ok_or_else(|| {
            malformed(format!("column '{}': unknown type code {}", raw.name, raw.code))
        })?;
        let column = match raw.data {
            RawData::Fixed {
                bytes,
                scale,
                nulls,
            } => {
                let column = Self::fixed(raw.name, engine_type, bytes, scale)?;
                match nulls {
                    Some(mask) => column.with_nulls(mask)?,
                    None => column,
                }
            }
            RawData::Var(values) => Self::variable(raw.name, engine_type, values)?,
        };
        let column = column.with_digits(raw.digits);
        if column.rows() != rows {
            return Err(malformed(format!(
                "column '{}': {} rows transferred, {} expected",
                column.name,
                column.rows(),
                rows
            )));
        }
        Ok(column)
    }

    /// Records the declared decimal digits reported by the engine.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared digits, 0 when unknown.
    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn engine_type(&self) -> EngineType {
        self.engine_type
    }

    /// Fractional digits of a scaled integer column, 0 otherwise.
    pub fn scale(&self) -> u32 {
        match &self.storage {
            Storage::Fixed { scale, .. } => *scale,
            Storage::Var(_) => 0,
        }
    }

    pub fn rows(&self) -> usize {
        match &self.storage {
            Storage::Fixed { data, .. } => match self.engine_type.byte_width() {
                Some(width) => data.len() / width,
                None => 0,
            },
            Storage::Var(values) => values.len(),
        }
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row < self.rows() {
            Ok(())
        } else {
            Err(Error::Range {
                what: "row",
                index: row as i64,
                count: self.rows(),
            })
        }
    }

    fn cell(&self, row: usize) -> Result<Cell<'_>> {
        self.check_row(row)?;
        let cell = match &self.storage {
            Storage::Fixed { data, scale, nulls } => {
                if nulls.as_ref().is_some_and(|mask| mask[row]) {
                    return Ok(Cell::Null);
                }
                let scale = *scale;
                match self.engine_type {
                    EngineType::Bool => Cell::Bool(data[row] != 0),
                    EngineType::Int8 => Cell::Int {
                        value: i8::from_le_bytes(read::<1>(data, row)) as i128,
                        scale,
                    },
                    EngineType::Int16 => Cell::Int {
                        value: i16::from_le_bytes(read::<2>(data, row)) as i128,
                        scale,
                    },
                    EngineType::Int32 | EngineType::Size => Cell::Int {
                        value: i32::from_le_bytes(read::<4>(data, row)) as i128,
                        scale,
                    },
                    EngineType::Int64 => Cell::Int {
                        value: i64::from_le_bytes(read::<8>(data, row)) as i128,
                        scale,
                    },
                    EngineType::Int128 => Cell::Int {
                        value: read_i128(data, row),
                        scale,
                    },
                    EngineType::Float => {
                        let v = f32::from_le_bytes(read::<4>(data, row));
                        if v.is_nan() { Cell::Null } else { Cell::Real(v) }
                    }
                    EngineType::Double => {
                        let v = f64::from_le_bytes(read::<8>(data, row));
                        if v.is_nan() { Cell::Null } else { Cell::Double(v) }
                    }
                    _ => Cell::Null,
                }
            }
            Storage::Var(values) => match &values[row] {
                None => Cell::Null,
                Some(VarValue::Text(s)) => Cell::Text(s),
                Some(VarValue::Blob(b)) => Cell::Bytes(b),
                Some(VarValue::Date(d)) => Cell::Date(*d),
                Some(VarValue::Time(t)) => Cell::Time(*t),
                Some(VarValue::Timestamp(ts)) => Cell::Timestamp(*ts),
            },
        };
        Ok(cell)
    }

    fn refuse<T>(&self, to: &'static str) -> Result<T> {
        Err(Error::coercion(self.engine_type, to))
    }

    pub fn is_null(&self, row: usize) -> Result<bool> {
        Ok(matches!(self.cell(row)?, Cell::Null))
    }

    /// The column's natural value at `row`.
    pub fn value(&self, row: usize) -> Result<Value> {
        let value = match self.cell(row)? {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(b),
            Cell::Int { scale, .. } if scale > 0 => match self.get_decimal(row)? {
                Some(d) => Value::Decimal(d),
                None => Value::Null,
            },
            Cell::Int { value, .. } => match self.engine_type {
                EngineType::Int8 => Value::TinyInt(value as i8),
                EngineType::Int16 => Value::SmallInt(value as i16),
                EngineType::Int32 | EngineType::Size => Value::Int(value as i32),
                EngineType::Int64 => Value::BigInt(value as i64),
                _ => Value::HugeInt(value),
            },
            Cell::Real(v) => Value::Real(v),
            Cell::Double(v) => Value::Double(v),
            Cell::Text(s) => match self.engine_type {
                EngineType::Date => Value::Date(parse_date(s)?),
                EngineType::Time => Value::Time(parse_time(s)?),
                EngineType::Timestamp => Value::Timestamp(parse_timestamp(s)?),
                _ => Value::Text(s.to_string()),
            },
            Cell::Bytes(b) => Value::Bytes(b.to_vec()),
            Cell::Date(d) => Value::Date(d),
            Cell::Time(t) => Value::Time(t),
            Cell::Timestamp(ts) => Value::Timestamp(ts),
        };
        Ok(value)
    }

    pub fn get_bool(&self, row: usize) -> Result<Option<bool>> {
        let value = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Bool(b) => b,
            Cell::Int { value, .. } => value != 0,
            Cell::Real(v) => v != 0.0,
            Cell::Double(v) => v != 0.0,
            Cell::Text(s) => parse_bool(s)?,
            _ => return self.refuse("bool"),
        };
        Ok(Some(value))
    }

    /// Integral value at `row`. Scaled columns drop their fraction and
    /// floating point values truncate toward zero.
    pub fn get_i128(&self, row: usize) -> Result<Option<i128>> {
        let value = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Bool(b) => b as i128,
            Cell::Int { value, scale: 0 } => value,
            Cell::Int { value, scale } => pow10(scale).map_or(0, |p| value / p),
            Cell::Real(v) => float_to_i128(v as f64)?,
            Cell::Double(v) => float_to_i128(v)?,
            Cell::Text(s) => s.trim().parse::<i128>().map_err(|_| Error::parse(s, "integer"))?,
            _ => return self.refuse("integer"),
        };
        Ok(Some(value))
    }

    pub fn get_i64(&self, row: usize) -> Result<Option<i64>> {
        self.narrow(row, "i64")
    }

    pub fn get_i32(&self, row: usize) -> Result<Option<i32>> {
        self.narrow(row, "i32")
    }

    pub fn get_i16(&self, row: usize) -> Result<Option<i16>> {
        self.narrow(row, "i16")
    }

    pub fn get_i8(&self, row: usize) -> Result<Option<i8>> {
        self.narrow(row, "i8")
    }

    fn narrow<T: TryFrom<i128>>(&self, row: usize, to: &'static str) -> Result<Option<T>> {
        match self.get_i128(row)? {
            None => Ok(None),
            Some(v) => T::try_from(v)
                .map(Some)
                .map_err(|_| Error::coercion(v, to)),
        }
    }

    pub fn get_f64(&self, row: usize) -> Result<Option<f64>> {
        let value = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Bool(b) => {
                if b { 1.0 } else { 0.0 }
            }
            Cell::Int { value, scale } => value as f64 / 10f64.powi(scale as i32),
            Cell::Real(v) => v as f64,
            Cell::Double(v) => v,
            Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| Error::parse(s, "f64"))?,
            _ => return self.refuse("f64"),
        };
        Ok(Some(value))
    }

    pub fn get_f32(&self, row: usize) -> Result<Option<f32>> {
        match self.cell(row)? {
            Cell::Real(v) => Ok(Some(v)),
            _ => Ok(self.get_f64(row)?.map(|v| v as f32)),
        }
    }

    pub fn get_decimal(&self, row: usize) -> Result<Option<Decimal>> {
        let value = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Bool(b) => Decimal::from(b as u8),
            Cell::Int { value, scale } => Decimal::try_from_i128_with_scale(value, scale)
                .map_err(|_| Error::coercion(format_unscaled(value, scale), "decimal"))?,
            Cell::Real(v) => Decimal::try_from(v).map_err(|_| Error::coercion(v, "decimal"))?,
            Cell::Double(v) => Decimal::try_from(v).map_err(|_| Error::coercion(v, "decimal"))?,
            Cell::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .map_err(|_| Error::parse(s, "decimal"))?
            }
            _ => return self.refuse("decimal"),
        };
        Ok(Some(value))
    }

    /// Canonical text form of any non-blob cell; blobs render as hex.
    pub fn get_string(&self, row: usize) -> Result<Option<String>> {
        let text = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Bool(b) => b.to_string(),
            Cell::Int { value, scale } => format_unscaled(value, scale),
            Cell::Real(v) => v.to_string(),
            Cell::Double(v) => v.to_string(),
            Cell::Text(s) => s.to_string(),
            Cell::Bytes(b) => hex::encode(b),
            Cell::Date(d) => d.format(DATE_FORMAT).to_string(),
            Cell::Time(t) => t.format(TIME_FORMAT).to_string(),
            Cell::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        };
        Ok(Some(text))
    }

    pub fn get_bytes(&self, row: usize) -> Result<Option<&[u8]>> {
        match self.cell(row)? {
            Cell::Null => Ok(None),
            Cell::Bytes(b) => Ok(Some(b)),
            _ => self.refuse("bytes"),
        }
    }

    pub fn get_blob(&self, row: usize) -> Result<Option<Blob<'_>>> {
        Ok(self.get_bytes(row)?.map(Blob::new))
    }

    pub fn get_date(&self, row: usize, fill: TemporalFill) -> Result<Option<NaiveDate>> {
        let date = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Date(d) => d,
            Cell::Timestamp(ts) => ts.date(),
            Cell::Time(_) => fill.apply("date", epoch_date)?,
            Cell::Text(s) => parse_date(s).or_else(|_| parse_timestamp(s).map(|ts| ts.date()))?,
            other => return Err(Error::coercion(other.describe(), "date")),
        };
        Ok(Some(date))
    }

    pub fn get_time(&self, row: usize, fill: TemporalFill) -> Result<Option<NaiveTime>> {
        let time = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Time(t) => t,
            Cell::Timestamp(ts) => ts.time(),
            Cell::Date(_) => fill.apply("time", NaiveTime::default)?,
            Cell::Text(s) => parse_time(s).or_else(|_| parse_timestamp(s).map(|ts| ts.time()))?,
            other => return Err(Error::coercion(other.describe(), "time")),
        };
        Ok(Some(time))
    }

    pub fn get_timestamp(
        &self,
        row: usize,
        fill: TemporalFill,
    ) -> Result<Option<NaiveDateTime>> {
        let ts = match self.cell(row)? {
            Cell::Null => return Ok(None),
            Cell::Timestamp(ts) => ts,
            Cell::Date(d) => fill.apply("timestamp", || d.and_time(NaiveTime::default()))?,
            Cell::Time(t) => fill.apply("timestamp", || epoch_date().and_time(t))?,
            Cell::Text(s) => match parse_timestamp(s) {
                Ok(ts) => ts,
                Err(err) => match parse_date(s) {
                    Ok(d) => fill.apply("timestamp", || d.and_time(NaiveTime::default()))?,
                    Err(_) => return Err(err),
                },
            },
            other => return Err(Error::coercion(other.describe(), "timestamp")),
        };
        Ok(Some(ts))
    }
}

fn float_to_i128(v: f64) -> Result<i128> {
    v.trunc()
        .to_i128()
        .ok_or_else(|| Error::coercion(v, "integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn int32s(values: &[i32]) -> Column {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Column::fixed("n", EngineType::Int32, data, 0.0).unwrap()
    }

    fn texts(values: &[Option<&str>]) -> Column {
        let values = values
            .iter()
            .map(|v| v.map(|s| VarValue::Text(s.to_string())))
            .collect();
        Column::variable("s", EngineType::Str, values).unwrap()
    }

    #[test]
    fn test_direct_and_widened_integer_reads() {
        let col = int32s(&[1, -2, i32::MAX]);
        assert_eq!(col.rows(), 3);
        assert_eq!(col.get_i32(1).unwrap(), Some(-2));
        assert_eq!(col.get_i64(2).unwrap(), Some(i32::MAX as i64));
        assert_eq!(col.get_f64(0).unwrap(), Some(1.0));
        assert_eq!(col.get_i8(0).unwrap(), Some(1));
        assert_eq!(col.get_string(1).unwrap().as_deref(), Some("-2"));
        assert_eq!(col.value(2).unwrap(), Value::Int(i32::MAX));
    }

    #[test]
    fn test_overflowing_narrowing_is_a_coercion_error() {
        let col = int32s(&[70_000]);
        let err = col.get_i16(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Coercion);
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_row_out_of_range_is_not_null() {
        let col = int32s(&[1]);
        let err = col.get_i32(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(col.get_string(5).is_err());
    }

    #[test]
    fn test_int128_byte_order() {
        let value: i128 = 0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10;
        let le = value.to_le_bytes();
        let mut reversed = le;
        reversed.reverse();
        let col = Column::fixed("h", EngineType::Int128, le.to_vec(), 0.0).unwrap();
        assert_eq!(col.get_i128(0).unwrap(), Some(i128::from_be_bytes(reversed)));
        assert_eq!(col.get_i128(0).unwrap(), Some(value));
        assert_eq!(col.value(0).unwrap(), Value::HugeInt(value));

        let negative = -(1i128 << 90);
        let col = Column::fixed("h", EngineType::Int128, negative.to_le_bytes().to_vec(), 0.0)
            .unwrap();
        assert_eq!(col.get_i128(0).unwrap(), Some(negative));
    }

    #[test]
    fn test_nan_is_null_for_floating_columns() {
        let data: Vec<u8> = [1.5f64, f64::NAN, -0.25]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let col = Column::fixed("d", EngineType::Double, data, 0.0).unwrap();
        assert_eq!(col.get_f64(0).unwrap(), Some(1.5));
        assert_eq!(col.get_f64(1).unwrap(), None);
        assert!(col.is_null(1).unwrap());
        assert!(!col.is_null(2).unwrap());

        let data: Vec<u8> = [f32::NAN, 2.0f32].iter().flat_map(|v| v.to_le_bytes()).collect();
        let col = Column::fixed("r", EngineType::Float, data, 0.0).unwrap();
        assert_eq!(col.get_f32(0).unwrap(), None);
        assert_eq!(col.get_f32(1).unwrap(), Some(2.0));
    }

    #[test]
    fn test_null_mask_on_fixed_column() {
        let col = int32s(&[7, 0, 9]).with_nulls(vec![false, true, false]).unwrap();
        assert_eq!(col.get_i32(0).unwrap(), Some(7));
        assert_eq!(col.get_i32(1).unwrap(), None);
        assert_eq!(col.value(1).unwrap(), Value::Null);
        assert!(int32s(&[1]).with_nulls(vec![true, false]).is_err());
    }

    #[test]
    fn test_decimal_scale_reconstruction() {
        assert_eq!(decimal_scale(0.0), 0);
        assert_eq!(decimal_scale(1.0), 0);
        assert_eq!(decimal_scale(10.0), 1);
        assert_eq!(decimal_scale(100.0), 2);
        assert_eq!(decimal_scale(1000.0), 3);
        assert_eq!(decimal_scale(1e7), 7);
        assert_eq!(decimal_scale(1e18), 18);
        assert_eq!(decimal_scale(f64::NAN), 0);
    }

    #[test]
    fn test_scaled_int32_byte_layout() {
        // DECIMAL(9,2) 1234.56 arrives as unscaled 123456 with multiplier 100.
        let col = Column::fixed(
            "price",
            EngineType::Int32,
            vec![0x40, 0xE2, 0x01, 0x00],
            100.0,
        )
        .unwrap();
        assert_eq!(col.scale(), 2);
        assert_eq!(
            col.get_decimal(0).unwrap(),
            Some(Decimal::from_str("1234.56").unwrap())
        );
        assert_eq!(col.get_string(0).unwrap().as_deref(), Some("1234.56"));
        assert_eq!(col.get_i64(0).unwrap(), Some(1234));
        assert_eq!(col.get_f64(0).unwrap(), Some(1234.56));
        assert_eq!(
            col.value(0).unwrap(),
            Value::Decimal(Decimal::from_str("1234.56").unwrap())
        );
    }

    #[test]
    fn test_scaled_int128_beyond_decimal_range() {
        let unscaled = i128::MAX;
        let col = Column::fixed("big", EngineType::Int128, unscaled.to_le_bytes().to_vec(), 1e10)
            .unwrap();
        assert_eq!(
            col.get_string(0).unwrap().as_deref(),
            Some("17014118346046923173168730371.5884105727")
        );
        assert_eq!(col.get_decimal(0).unwrap_err().kind(), ErrorKind::Coercion);
    }

    #[test]
    fn test_text_column_parsing() {
        let col = texts(&[Some("42"), Some("true"), Some("x"), None, Some("2.5")]);
        assert_eq!(col.get_i32(0).unwrap(), Some(42));
        assert_eq!(col.get_bool(1).unwrap(), Some(true));
        assert_eq!(col.get_i32(2).unwrap_err().kind(), ErrorKind::Coercion);
        assert_eq!(col.get_i32(3).unwrap(), None);
        assert_eq!(col.get_f64(4).unwrap(), Some(2.5));
        assert_eq!(
            col.get_decimal(4).unwrap(),
            Some(Decimal::from_str("2.5").unwrap())
        );
    }

    #[test]
    fn test_bool_column() {
        let col = Column::fixed("b", EngineType::Bool, vec![0, 1, 2], 0.0).unwrap();
        assert_eq!(col.get_bool(0).unwrap(), Some(false));
        assert_eq!(col.get_bool(2).unwrap(), Some(true));
        assert_eq!(col.get_i32(1).unwrap(), Some(1));
        assert_eq!(col.get_string(1).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_blob_column() {
        let col = Column::variable(
            "b",
            EngineType::Blob,
            vec![Some(VarValue::Blob(vec![0xca, 0xfe])), None],
        )
        .unwrap();
        assert_eq!(col.get_bytes(0).unwrap(), Some(&[0xca, 0xfe][..]));
        assert_eq!(col.get_blob(0).unwrap().map(|b| b.len()), Some(2));
        assert_eq!(col.get_string(0).unwrap().as_deref(), Some("cafe"));
        assert_eq!(col.get_bytes(1).unwrap(), None);
        assert_eq!(col.get_i32(0).unwrap_err().kind(), ErrorKind::Coercion);
        assert_eq!(int32s(&[1]).get_bytes(0).unwrap_err().kind(), ErrorKind::Coercion);
    }

    #[test]
    fn test_textual_temporal_columns() {
        let col = Column::variable(
            "d",
            EngineType::Date,
            vec![Some(VarValue::Text("2024-03-01".into()))],
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(col.get_date(0, TemporalFill::Midnight).unwrap(), Some(date));
        assert_eq!(col.value(0).unwrap(), Value::Date(date));

        let col = Column::variable(
            "ts",
            EngineType::Timestamp,
            vec![Some(VarValue::Text("2024-03-01 10:20:30.5".into()))],
        )
        .unwrap();
        assert_eq!(col.get_date(0, TemporalFill::Reject).unwrap(), Some(date));
        assert_eq!(
            col.get_time(0, TemporalFill::Reject).unwrap(),
            NaiveTime::from_hms_milli_opt(10, 20, 30, 500)
        );
    }

    #[test]
    fn test_temporal_projection_policies() {
        let date = NaiveDate::from_ymd_opt(2020, 5, 17).unwrap();
        let col = Column::variable("d", EngineType::Date, vec![Some(VarValue::Date(date))])
            .unwrap();
        assert_eq!(
            col.get_timestamp(0, TemporalFill::Midnight).unwrap(),
            date.and_hms_opt(0, 0, 0)
        );
        let err = col.get_timestamp(0, TemporalFill::Reject).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Coercion);
        assert!(err.to_string().contains("temporal_fill"));

        let time = NaiveTime::from_hms_opt(8, 15, 0).unwrap();
        let col = Column::variable("t", EngineType::Time, vec![Some(VarValue::Time(time))])
            .unwrap();
        assert_eq!(
            col.get_timestamp(0, TemporalFill::Midnight).unwrap(),
            Some(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_time(time))
        );
        assert!(col.get_date(0, TemporalFill::Reject).is_err());
    }

    #[test]
    fn test_storage_validation() {
        assert!(Column::fixed("x", EngineType::Str, vec![], 0.0).is_err());
        assert!(Column::fixed("x", EngineType::Int32, vec![0; 6], 0.0).is_err());
        assert!(Column::variable("x", EngineType::Int64, vec![]).is_err());
        assert!(
            Column::variable("x", EngineType::Blob, vec![Some(VarValue::Text("a".into()))])
                .is_err()
        );

        let raw = RawColumn {
            name: "n".into(),
            code: 3,
            digits: 0,
            data: RawData::Fixed {
                bytes: vec![0; 8],
                scale: 0.0,
                nulls: None,
            },
        };
        assert_eq!(Column::from_raw(raw.clone(), 2).unwrap().rows(), 2);
        assert_eq!(
            Column::from_raw(raw.clone(), 3).unwrap_err().kind(),
            ErrorKind::Boundary
        );
        let bad_code = RawColumn { code: 42, ..raw };
        assert!(Column::from_raw(bad_code, 2).is_err());
    }
}
