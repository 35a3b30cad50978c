///
/// Parameter binding encoder.
///
/// `encode` turns one host value into one engine-level bind call. Dispatch
/// is two-staged: the value's category picks the conversion family, then
/// the requested relational type picks the exact rule inside it. A null is
/// bound as a null tagged with the target's engine type.
///
/// Decimals bind as their unscaled integer, narrowed to the smallest of the
/// 8/16/32/64/128-bit widths that holds it, plus a separate scale. That is
/// the exact inverse of the scaled-integer decode in `column`.
///
/// `PreparedStatement` stages one encoded value per slot. Every slot must be
/// bound before execution; a batch captures the staged vector per entry and
/// replays bind + execute for each one.
///

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, trace, warn};

use crate::config::TemporalFill;
use crate::cursor::{CursorOptions, Cursor};
use crate::error::{Error, Result};
use crate::metadata::{ParameterMetadata, ResultMetadata};
use crate::native::{
    BoundValue, ColumnDescriptor, Engine, Outcome, PreparedInfo, StatementHandle,
    TypeDescriptor, UpdateCount, Unscaled,
};
use crate::statement::Execution;
use crate::types::{EngineType, HostClass, SqlType};
use crate::value::{
    parse_bool, parse_date, parse_time, parse_timestamp, HostValue, Number, DATE_FORMAT,
    TIMESTAMP_FORMAT, TIME_FORMAT,
};

/// Largest scale an exact decimal host value can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Encodes `value` for a slot of relational type `target`. `scale`, when
/// given, rescales decimal targets before the unscaled value is taken.
pub fn encode(
    value: &HostValue,
    target: SqlType,
    scale: Option<u32>,
    fill: TemporalFill,
) -> Result<BoundValue> {
    if matches!(target, SqlType::Null | SqlType::Other) {
        if let Some(class) = value.class() {
            return encode(value, class.default_sql_type(), scale, fill);
        }
    }

    match value {
        HostValue::Null => Ok(BoundValue::Null(target.engine_type())),
        HostValue::Text(s) => encode_text(s, target, scale, fill),
        HostValue::Uri(s) if target.is_character() => Ok(BoundValue::Str(s.clone())),
        HostValue::Number(n) => encode_number(n, target, scale),
        HostValue::Bool(b) => encode_bool(*b, target, scale),
        HostValue::BigInt(v) => encode_big_int(*v, target, scale),
        HostValue::Bytes(b) if target.is_binary() => Ok(BoundValue::Blob(b.clone())),
        HostValue::Bytes(b) if target.is_character() => Ok(BoundValue::Str(hex::encode(b))),
        HostValue::Blob(b) if target.is_binary() => Ok(BoundValue::Blob(b.clone())),
        HostValue::Date(d) => match target {
            SqlType::Date => Ok(BoundValue::Date(*d)),
            SqlType::Timestamp => Ok(BoundValue::Timestamp(
                fill.apply("timestamp", || d.and_time(NaiveTime::default()))?,
            )),
            t if t.is_character() => Ok(BoundValue::Str(d.format(DATE_FORMAT).to_string())),
            _ => Err(refuse(value, target)),
        },
        HostValue::Time(t) => match target {
            SqlType::Time => Ok(BoundValue::Time(*t)),
            SqlType::Timestamp => Ok(BoundValue::Timestamp(
                fill.apply("timestamp", || NaiveDate::default().and_time(*t))?,
            )),
            ty if ty.is_character() => Ok(BoundValue::Str(t.format(TIME_FORMAT).to_string())),
            _ => Err(refuse(value, target)),
        },
        HostValue::Timestamp(ts) => match target {
            SqlType::Timestamp => Ok(BoundValue::Timestamp(*ts)),
            SqlType::Date => Ok(BoundValue::Date(ts.date())),
            SqlType::Time => Ok(BoundValue::Time(ts.time())),
            t if t.is_character() => {
                Ok(BoundValue::Str(ts.format(TIMESTAMP_FORMAT).to_string()))
            }
            _ => Err(refuse(value, target)),
        },
        HostValue::Uri(_) | HostValue::Bytes(_) | HostValue::Blob(_) => Err(refuse(value, target)),
    }
}

fn refuse(value: &HostValue, target: SqlType) -> Error {
    Error::coercion(value.kind_name(), target.name())
}

fn narrow<T: TryFrom<i128>>(v: i128, target: SqlType) -> Result<T> {
    T::try_from(v).map_err(|_| Error::coercion(v, target.name()))
}

fn encode_decimal(value: Decimal, scale: Option<u32>) -> Result<BoundValue> {
    let mut value = value;
    if let Some(scale) = scale {
        if scale > MAX_DECIMAL_SCALE {
            return Err(Error::coercion(format!("scale {}", scale), "DECIMAL"));
        }
        value.rescale(scale);
        if value.scale() != scale {
            return Err(Error::coercion(value, "DECIMAL"));
        }
    }
    Ok(BoundValue::Decimal {
        unscaled: Unscaled::narrowest(value.mantissa()),
        scale: value.scale(),
    })
}

fn encode_text(
    s: &str,
    target: SqlType,
    scale: Option<u32>,
    fill: TemporalFill,
) -> Result<BoundValue> {
    use SqlType as T;
    let trimmed = s.trim();
    let int = |what: &'static str| {
        trimmed
            .parse::<i128>()
            .map_err(|_| Error::parse(s, what))
    };
    let bound = match target {
        T::Boolean | T::Bit => BoundValue::Bool(parse_bool(s)?),
        T::TinyInt => BoundValue::I8(narrow(int("TINYINT")?, target)?),
        T::SmallInt => BoundValue::I16(narrow(int("SMALLINT")?, target)?),
        T::Integer => BoundValue::I32(narrow(int("INTEGER")?, target)?),
        T::BigInt => BoundValue::I64(narrow(int("BIGINT")?, target)?),
        T::Real => BoundValue::F32(trimmed.parse().map_err(|_| Error::parse(s, "REAL"))?),
        T::Float | T::Double => {
            BoundValue::F64(trimmed.parse().map_err(|_| Error::parse(s, "DOUBLE"))?)
        }
        T::Decimal | T::Numeric => {
            let d = trimmed
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map_err(|_| Error::parse(s, "DECIMAL"))?;
            encode_decimal(d, scale)?
        }
        T::Date => BoundValue::Date(parse_date(s)?),
        T::Time => BoundValue::Time(parse_time(s)?),
        T::Timestamp => match parse_timestamp(s) {
            Ok(ts) => BoundValue::Timestamp(ts),
            Err(err) => match parse_date(s) {
                Ok(d) => BoundValue::Timestamp(
                    fill.apply("timestamp", || d.and_time(NaiveTime::default()))?,
                ),
                Err(_) => return Err(err),
            },
        },
        T::Binary | T::VarBinary | T::LongVarBinary | T::Blob => {
            BoundValue::Blob(s.as_bytes().to_vec())
        }
        T::Char
        | T::Varchar
        | T::LongVarchar
        | T::NChar
        | T::NVarchar
        | T::LongNVarchar
        | T::Clob
        | T::Null
        | T::Other => BoundValue::Str(s.to_string()),
    };
    Ok(bound)
}

fn number_to_i128(n: &Number) -> Result<i128> {
    let v = match n {
        Number::I8(v) => *v as i128,
        Number::I16(v) => *v as i128,
        Number::I32(v) => *v as i128,
        Number::I64(v) => *v as i128,
        Number::F32(v) => (*v as f64)
            .trunc()
            .to_i128()
            .ok_or_else(|| Error::coercion(v, "integer"))?,
        Number::F64(v) => v
            .trunc()
            .to_i128()
            .ok_or_else(|| Error::coercion(v, "integer"))?,
        Number::Decimal(d) => d
            .trunc()
            .to_i128()
            .ok_or_else(|| Error::coercion(d, "integer"))?,
    };
    Ok(v)
}

fn number_to_f64(n: &Number) -> f64 {
    match n {
        Number::I8(v) => *v as f64,
        Number::I16(v) => *v as f64,
        Number::I32(v) => *v as f64,
        Number::I64(v) => *v as f64,
        Number::F32(v) => *v as f64,
        Number::F64(v) => *v,
        Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
    }
}

fn number_to_decimal(n: &Number) -> Result<Decimal> {
    match n {
        Number::I8(v) => Ok(Decimal::from(*v)),
        Number::I16(v) => Ok(Decimal::from(*v)),
        Number::I32(v) => Ok(Decimal::from(*v)),
        Number::I64(v) => Ok(Decimal::from(*v)),
        Number::F32(v) => Decimal::try_from(*v).map_err(|_| Error::coercion(v, "DECIMAL")),
        Number::F64(v) => Decimal::try_from(*v).map_err(|_| Error::coercion(v, "DECIMAL")),
        Number::Decimal(d) => Ok(*d),
    }
}

fn encode_number(n: &Number, target: SqlType, scale: Option<u32>) -> Result<BoundValue> {
    use SqlType as T;
    let bound = match target {
        T::Boolean | T::Bit => BoundValue::Bool(number_to_f64(n) != 0.0),
        T::TinyInt => BoundValue::I8(narrow(number_to_i128(n)?, target)?),
        T::SmallInt => BoundValue::I16(narrow(number_to_i128(n)?, target)?),
        T::Integer => BoundValue::I32(narrow(number_to_i128(n)?, target)?),
        T::BigInt => BoundValue::I64(narrow(number_to_i128(n)?, target)?),
        T::Real => BoundValue::F32(number_to_f64(n) as f32),
        T::Float | T::Double => BoundValue::F64(number_to_f64(n)),
        T::Decimal | T::Numeric => encode_decimal(number_to_decimal(n)?, scale)?,
        t if t.is_character() => BoundValue::Str(n.to_string()),
        _ => return Err(Error::coercion("number", target.name())),
    };
    Ok(bound)
}

fn encode_bool(b: bool, target: SqlType, scale: Option<u32>) -> Result<BoundValue> {
    use SqlType as T;
    let bound = match target {
        T::Boolean | T::Bit => BoundValue::Bool(b),
        T::TinyInt => BoundValue::I8(b as i8),
        T::SmallInt => BoundValue::I16(b as i16),
        T::Integer => BoundValue::I32(b as i32),
        T::BigInt => BoundValue::I64(b as i64),
        T::Real => BoundValue::F32(if b { 1.0 } else { 0.0 }),
        T::Float | T::Double => BoundValue::F64(if b { 1.0 } else { 0.0 }),
        T::Decimal | T::Numeric => encode_decimal(Decimal::from(b as u8), scale)?,
        t if t.is_character() => BoundValue::Str(b.to_string()),
        _ => return Err(Error::coercion("bool", target.name())),
    };
    Ok(bound)
}

fn encode_big_int(v: i128, target: SqlType, scale: Option<u32>) -> Result<BoundValue> {
    use SqlType as T;
    let bound = match target {
        T::Boolean | T::Bit => BoundValue::Bool(v != 0),
        T::TinyInt => BoundValue::I8(narrow(v, target)?),
        T::SmallInt => BoundValue::I16(narrow(v, target)?),
        T::Integer => BoundValue::I32(narrow(v, target)?),
        T::BigInt => BoundValue::I64(narrow(v, target)?),
        T::Real => BoundValue::F32(v as f32),
        T::Float | T::Double => BoundValue::F64(v as f64),
        T::Decimal | T::Numeric => {
            let scale = scale.unwrap_or(0);
            let unscaled = 10i128
                .checked_pow(scale)
                .and_then(|p| v.checked_mul(p))
                .ok_or_else(|| Error::coercion(v, target.name()))?;
            BoundValue::Decimal {
                unscaled: Unscaled::narrowest(unscaled),
                scale,
            }
        }
        t if t.is_character() => BoundValue::Str(v.to_string()),
        _ => return Err(Error::coercion("big integer", target.name())),
    };
    Ok(bound)
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    value: HostValue,
    target: SqlType,
    scale: Option<u32>,
    bound: BoundValue,
}

pub struct PreparedStatement<'s> {
    engine: &'s dyn Engine,
    handle: StatementHandle,
    params: Vec<TypeDescriptor>,
    columns: Vec<ColumnDescriptor>,
    slots: Vec<Option<Slot>>,
    batch: Vec<Vec<Slot>>,
    options: CursorOptions,
    closed: bool,
}

impl std::fmt::Debug for PreparedStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("handle", &self.handle)
            .field("params", &self.params.len())
            .field("batch", &self.batch.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl<'s> PreparedStatement<'s> {
    pub(crate) fn new(engine: &'s dyn Engine, info: PreparedInfo, options: CursorOptions) -> Self {
        let slots = vec![None; info.params.len()];
        Self {
            engine,
            handle: info.handle,
            params: info.params,
            columns: info.columns,
            slots,
            batch: Vec::new(),
            options,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed {
                what: "PreparedStatement",
            })
        } else {
            Ok(())
        }
    }

    fn descriptor(&self, index: usize) -> Result<&TypeDescriptor> {
        index
            .checked_sub(1)
            .and_then(|i| self.params.get(i))
            .ok_or(Error::Range {
                what: "parameter",
                index: index as i64,
                count: self.params.len(),
            })
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn set_max_rows(&mut self, max_rows: u64) {
        self.options.max_rows = max_rows;
    }

    pub fn max_rows(&self) -> u64 {
        self.options.max_rows
    }

    fn stage(
        &mut self,
        index: usize,
        value: HostValue,
        target: SqlType,
        scale: Option<u32>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.descriptor(index)?;
        let bound = encode(&value, target, scale, self.options.temporal_fill)?;
        trace!(index, target = target.name(), "staged parameter");
        self.slots[index - 1] = Some(Slot {
            value,
            target,
            scale,
            bound,
        });
        Ok(())
    }

    /// Binds against the slot's declared type, or against the default type
    /// of the value's class when the engine did not report one.
    pub fn set_value(&mut self, index: usize, value: impl Into<HostValue>) -> Result<()> {
        let value = value.into();
        let declared = *self.descriptor(index)?;
        let engine_type = EngineType::from_code(declared.code).unwrap_or(EngineType::Unknown);
        let (target, scale) = if engine_type == EngineType::Unknown {
            let target = value
                .class()
                .map_or(SqlType::Null, HostClass::default_sql_type);
            (target, None)
        } else if declared.scale > 0 && engine_type.is_integer() {
            (SqlType::Decimal, Some(declared.scale))
        } else {
            (engine_type.relational_type(), None)
        };
        self.stage(index, value, target, scale)
    }

    pub fn set_value_as(
        &mut self,
        index: usize,
        value: impl Into<HostValue>,
        target: SqlType,
        scale: Option<u32>,
    ) -> Result<()> {
        self.stage(index, value.into(), target, scale)
    }

    /// Binds a null typed with the slot's declared engine type.
    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.ensure_open()?;
        let declared = self.descriptor(index)?;
        let engine_type = EngineType::from_code(declared.code).unwrap_or(EngineType::Unknown);
        self.slots[index - 1] = Some(Slot {
            value: HostValue::Null,
            target: engine_type.relational_type(),
            scale: None,
            bound: BoundValue::Null(engine_type),
        });
        Ok(())
    }

    pub fn set_bool(&mut self, index: usize, value: bool) -> Result<()> {
        self.set_value_as(index, value, SqlType::Boolean, None)
    }

    pub fn set_i8(&mut self, index: usize, value: i8) -> Result<()> {
        self.set_value_as(index, value, SqlType::TinyInt, None)
    }

    pub fn set_i16(&mut self, index: usize, value: i16) -> Result<()> {
        self.set_value_as(index, value, SqlType::SmallInt, None)
    }

    pub fn set_i32(&mut self, index: usize, value: i32) -> Result<()> {
        self.set_value_as(index, value, SqlType::Integer, None)
    }

    pub fn set_i64(&mut self, index: usize, value: i64) -> Result<()> {
        self.set_value_as(index, value, SqlType::BigInt, None)
    }

    pub fn set_i128(&mut self, index: usize, value: i128) -> Result<()> {
        self.set_value_as(index, value, SqlType::Numeric, None)
    }

    pub fn set_f32(&mut self, index: usize, value: f32) -> Result<()> {
        self.set_value_as(index, value, SqlType::Real, None)
    }

    pub fn set_f64(&mut self, index: usize, value: f64) -> Result<()> {
        self.set_value_as(index, value, SqlType::Double, None)
    }

    pub fn set_decimal(&mut self, index: usize, value: Decimal) -> Result<()> {
        self.set_value_as(index, value, SqlType::Decimal, Some(value.scale()))
    }

    pub fn set_string(&mut self, index: usize, value: &str) -> Result<()> {
        self.set_value_as(index, value, SqlType::Varchar, None)
    }

    pub fn set_bytes(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.set_value_as(index, value, SqlType::VarBinary, None)
    }

    pub fn set_blob(&mut self, index: usize, value: Vec<u8>) -> Result<()> {
        self.set_value_as(index, HostValue::Blob(value), SqlType::Blob, None)
    }

    pub fn set_date(&mut self, index: usize, value: NaiveDate) -> Result<()> {
        self.set_value_as(index, value, SqlType::Date, None)
    }

    pub fn set_time(&mut self, index: usize, value: NaiveTime) -> Result<()> {
        self.set_value_as(index, value, SqlType::Time, None)
    }

    pub fn set_timestamp(&mut self, index: usize, value: chrono::NaiveDateTime) -> Result<()> {
        self.set_value_as(index, value, SqlType::Timestamp, None)
    }

    pub fn set_uri(&mut self, index: usize, value: &str) -> Result<()> {
        self.set_value_as(index, HostValue::Uri(value.to_string()), SqlType::Varchar, None)
    }

    pub fn clear_parameters(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.slots.iter_mut().for_each(|s| *s = None);
        Ok(())
    }

    /// The host value staged in a slot, if any.
    pub fn parameter(&self, index: usize) -> Result<Option<&HostValue>> {
        self.descriptor(index)?;
        Ok(self.slots[index - 1].as_ref().map(|s| &s.value))
    }

    fn staged(&self) -> Result<Vec<Slot>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| slot.clone().ok_or(Error::Unbound { index: i + 1 }))
            .collect()
    }

    fn bind_all(&self, slots: &[Slot]) -> Result<()> {
        self.engine.clear_bindings(self.handle)?;
        for (i, slot) in slots.iter().enumerate() {
            self.engine.bind(self.handle, i, &slot.bound)?;
        }
        Ok(())
    }

    pub fn execute(&mut self) -> Result<Execution<'s>> {
        self.ensure_open()?;
        let slots = self.staged()?;
        self.bind_all(&slots)?;
        debug!(handle = self.handle.0, params = slots.len(), "executing prepared statement");
        let outcome = self
            .engine
            .execute_prepared(self.handle, self.options.max_rows)?;
        Execution::from_outcome(self.engine, outcome, self.options)
    }

    pub fn execute_query(&mut self) -> Result<Cursor<'s>> {
        self.execute()?.into_cursor()
    }

    pub fn execute_update(&mut self) -> Result<UpdateCount> {
        self.execute()?.into_update_count()
    }

    /// Captures the currently bound parameters as one batch entry.
    pub fn add_batch(&mut self) -> Result<()> {
        self.ensure_open()?;
        let slots = self.staged()?;
        self.batch.push(slots);
        Ok(())
    }

    pub fn clear_batch(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.batch.clear();
        Ok(())
    }

    fn run_entry(&self, slots: &[Slot]) -> Result<UpdateCount> {
        self.bind_all(slots)?;
        match self.engine.execute_prepared(self.handle, 0)? {
            Outcome::Affected(count) => Ok(count),
            Outcome::Rows { result, .. } => {
                self.engine.release_result(result)?;
                Err(Error::UnexpectedResultSet)
            }
        }
    }

    /// Runs every captured entry in order and returns their update counts.
    /// The batch is emptied whether or not it succeeds.
    pub fn execute_batch(&mut self) -> Result<Vec<UpdateCount>> {
        self.ensure_open()?;
        let batch = std::mem::take(&mut self.batch);
        let mut completed = Vec::with_capacity(batch.len());
        for (index, slots) in batch.iter().enumerate() {
            match self.run_entry(slots) {
                Ok(count) => completed.push(count),
                Err(source) => {
                    debug!(index, completed = completed.len(), "batch aborted");
                    return Err(Error::Batch {
                        completed,
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }
        debug!(entries = completed.len(), "batch executed");
        Ok(completed)
    }

    pub fn parameter_metadata(&self) -> Result<ParameterMetadata> {
        self.ensure_open()?;
        Ok(ParameterMetadata::from_descriptors(&self.params))
    }

    pub fn result_metadata(&self) -> Result<ResultMetadata> {
        self.ensure_open()?;
        Ok(ResultMetadata::from_descriptors(&self.columns))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!(handle = self.handle.0, "releasing prepared statement");
        self.engine.release_statement(self.handle)?;
        Ok(())
    }
}

impl Drop for PreparedStatement<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("closing prepared statement on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use chrono::NaiveDateTime;

    use crate::column::Column;
    use crate::error::ErrorKind;
    use crate::mock::MockEngine;

    fn enc(value: impl Into<HostValue>, target: SqlType) -> Result<BoundValue> {
        encode(&value.into(), target, None, TemporalFill::Midnight)
    }

    /// Packs a fixed-width bound value into the engine's column layout.
    fn as_column(bound: &BoundValue) -> Column {
        let (ty, bytes, scale) = match bound {
            BoundValue::Bool(b) => (EngineType::Bool, vec![*b as u8], 0.0),
            BoundValue::I8(v) => (EngineType::Int8, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::I16(v) => (EngineType::Int16, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::I32(v) => (EngineType::Int32, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::I64(v) => (EngineType::Int64, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::I128(v) => (EngineType::Int128, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::F32(v) => (EngineType::Float, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::F64(v) => (EngineType::Double, v.to_le_bytes().to_vec(), 0.0),
            BoundValue::Decimal { unscaled, scale } => (
                unscaled.engine_type(),
                unscaled.to_le_bytes(),
                10f64.powi(*scale as i32),
            ),
            other => panic!("not fixed width: {:?}", other),
        };
        Column::fixed("v", ty, bytes, scale).unwrap()
    }

    #[test]
    fn test_fixed_width_round_trip() {
        for v in [0i8, i8::MIN, i8::MAX] {
            let col = as_column(&enc(v, SqlType::TinyInt).unwrap());
            assert_eq!(col.get_i8(0).unwrap(), Some(v));
        }
        for v in [0i16, i16::MIN, i16::MAX] {
            let col = as_column(&enc(v, SqlType::SmallInt).unwrap());
            assert_eq!(col.get_i16(0).unwrap(), Some(v));
        }
        for v in [0i32, i32::MIN, i32::MAX] {
            let col = as_column(&enc(v, SqlType::Integer).unwrap());
            assert_eq!(col.get_i32(0).unwrap(), Some(v));
        }
        for v in [0i64, i64::MIN, i64::MAX] {
            let col = as_column(&enc(v, SqlType::BigInt).unwrap());
            assert_eq!(col.get_i64(0).unwrap(), Some(v));
        }
        for v in [0f32, f32::MIN, f32::MAX] {
            let col = as_column(&enc(v, SqlType::Real).unwrap());
            assert_eq!(col.get_f32(0).unwrap(), Some(v));
        }
        for v in [0f64, f64::MIN, f64::MAX] {
            let col = as_column(&enc(v, SqlType::Double).unwrap());
            assert_eq!(col.get_f64(0).unwrap(), Some(v));
        }
        for v in [true, false] {
            let col = as_column(&enc(v, SqlType::Boolean).unwrap());
            assert_eq!(col.get_bool(0).unwrap(), Some(v));
        }
        for v in [0i128, i128::MIN, i128::MAX] {
            let bound = BoundValue::I128(v);
            assert_eq!(as_column(&bound).get_i128(0).unwrap(), Some(v));
        }
    }

    #[test]
    fn test_decimal_scale_inverse() {
        let cases = [
            ("0", EngineType::Int8),
            ("1.27", EngineType::Int8),
            ("-1.28", EngineType::Int8),
            ("327.67", EngineType::Int16),
            ("-32.768", EngineType::Int16),
            ("2147483.647", EngineType::Int32),
            ("-21474836.48", EngineType::Int32),
            ("92233720368547.75807", EngineType::Int64),
            ("-9223372036854775808", EngineType::Int64),
            ("9223372036854775808", EngineType::Int128),
            ("79228162514264337593543950335", EngineType::Int128),
            ("0.0000000000000000000000000001", EngineType::Int8),
            ("7.9228162514264337593543950335", EngineType::Int128),
        ];
        for (text, width) in cases {
            let value = Decimal::from_str(text).unwrap();
            let bound = enc(value, SqlType::Decimal).unwrap();
            let BoundValue::Decimal { unscaled, scale } = bound else {
                panic!("expected decimal for {}", text);
            };
            assert_eq!(unscaled.engine_type(), width, "{}", text);
            assert_eq!(scale, value.scale(), "{}", text);
            let col = as_column(&bound);
            assert_eq!(col.get_decimal(0).unwrap(), Some(value), "{}", text);
        }
    }

    #[test]
    fn test_decimal_rescaled_to_slot_scale() {
        let bound = encode(
            &HostValue::from(Decimal::from_str("12.5").unwrap()),
            SqlType::Decimal,
            Some(3),
            TemporalFill::Midnight,
        )
        .unwrap();
        assert_eq!(
            bound,
            BoundValue::Decimal {
                unscaled: Unscaled::I16(12_500),
                scale: 3
            }
        );
        assert!(encode(
            &HostValue::from(1i32),
            SqlType::Decimal,
            Some(40),
            TemporalFill::Midnight
        )
        .is_err());
        // 27 digits at scale 3 does not fit a 96-bit mantissa
        assert!(encode(
            &HostValue::from(Decimal::from_str("123456789012345678901234567").unwrap()),
            SqlType::Decimal,
            Some(3),
            TemporalFill::Midnight
        )
        .is_err());
    }

    #[test]
    fn test_big_integer_targets() {
        let huge = 1i128 << 100;
        assert_eq!(
            enc(huge, SqlType::Numeric).unwrap(),
            BoundValue::Decimal {
                unscaled: Unscaled::I128(huge),
                scale: 0
            }
        );
        assert_eq!(enc(5i128, SqlType::BigInt).unwrap(), BoundValue::I64(5));
        assert_eq!(enc(huge, SqlType::BigInt).unwrap_err().kind(), ErrorKind::Coercion);
        assert_eq!(
            enc(huge, SqlType::Varchar).unwrap(),
            BoundValue::Str(huge.to_string())
        );
    }

    #[test]
    fn test_bool_against_numeric_targets() {
        assert_eq!(enc(true, SqlType::Integer).unwrap(), BoundValue::I32(1));
        assert_eq!(enc(false, SqlType::TinyInt).unwrap(), BoundValue::I8(0));
        assert_eq!(enc(true, SqlType::Double).unwrap(), BoundValue::F64(1.0));
        assert_eq!(
            enc(true, SqlType::Varchar).unwrap(),
            BoundValue::Str("true".into())
        );
        assert_eq!(enc(true, SqlType::Date).unwrap_err().kind(), ErrorKind::Coercion);
    }

    #[test]
    fn test_numbers_against_other_targets() {
        assert_eq!(
            enc(2.5f64, SqlType::Varchar).unwrap(),
            BoundValue::Str("2.5".into())
        );
        assert_eq!(enc(2.9f64, SqlType::Integer).unwrap(), BoundValue::I32(2));
        assert_eq!(enc(0i32, SqlType::Boolean).unwrap(), BoundValue::Bool(false));
        assert_eq!(enc(300i32, SqlType::TinyInt).unwrap_err().kind(), ErrorKind::Coercion);
        assert_eq!(enc(f64::NAN, SqlType::BigInt).unwrap_err().kind(), ErrorKind::Coercion);
        let err = enc(1i32, SqlType::Blob).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conversion not allowed from number to BLOB"
        );
    }

    #[test]
    fn test_text_parsed_for_typed_targets() {
        assert_eq!(enc("42", SqlType::SmallInt).unwrap(), BoundValue::I16(42));
        assert_eq!(enc("t", SqlType::Boolean).unwrap(), BoundValue::Bool(true));
        assert_eq!(
            enc("2024-05-06", SqlType::Date).unwrap(),
            BoundValue::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
        );
        assert_eq!(
            enc("2024-05-06", SqlType::Timestamp).unwrap(),
            BoundValue::Timestamp(
                NaiveDate::from_ymd_opt(2024, 5, 6)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            enc("1.50", SqlType::Numeric).unwrap(),
            BoundValue::Decimal {
                unscaled: Unscaled::I16(150),
                scale: 2
            }
        );
        assert_eq!(enc("abc", SqlType::Integer).unwrap_err().kind(), ErrorKind::Coercion);
        assert_eq!(
            enc("abc", SqlType::Clob).unwrap(),
            BoundValue::Str("abc".into())
        );
    }

    #[test]
    fn test_nulls_stay_typed() {
        assert_eq!(
            enc(HostValue::Null, SqlType::Timestamp).unwrap(),
            BoundValue::Null(EngineType::Timestamp)
        );
        assert_eq!(
            enc(HostValue::Null, SqlType::Other).unwrap(),
            BoundValue::Null(EngineType::Unknown)
        );
    }

    #[test]
    fn test_untyped_target_uses_value_class() {
        assert_eq!(enc(7i64, SqlType::Other).unwrap(), BoundValue::I64(7));
        assert_eq!(
            enc("x", SqlType::Null).unwrap(),
            BoundValue::Str("x".into())
        );
    }

    #[test]
    fn test_temporal_projection_on_bind() {
        let ts = NaiveDateTime::parse_from_str("2021-07-08 09:10:11", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(enc(ts, SqlType::Date).unwrap(), BoundValue::Date(ts.date()));
        assert_eq!(enc(ts, SqlType::Time).unwrap(), BoundValue::Time(ts.time()));
        let date = ts.date();
        assert!(encode(&date.into(), SqlType::Timestamp, None, TemporalFill::Reject).is_err());
        assert_eq!(
            enc(ts.time(), SqlType::Varchar).unwrap(),
            BoundValue::Str("09:10:11".into())
        );
    }

    #[test]
    fn test_bytes_blobs_and_uris() {
        assert_eq!(
            enc(vec![1u8, 2], SqlType::Blob).unwrap(),
            BoundValue::Blob(vec![1, 2])
        );
        assert_eq!(
            enc(vec![0xabu8], SqlType::Varchar).unwrap(),
            BoundValue::Str("ab".into())
        );
        assert!(enc(HostValue::Blob(vec![1]), SqlType::Varchar).is_err());
        assert_eq!(
            enc(HostValue::Uri("http://x".into()), SqlType::Varchar).unwrap(),
            BoundValue::Str("http://x".into())
        );
        assert!(enc(HostValue::Uri("http://x".into()), SqlType::Integer).is_err());
    }

    #[test]
    fn test_execute_requires_every_slot() {
        let engine = MockEngine::new().with_params(2);
        let info = engine.prepare("INSERT INTO t VALUES (?, ?)").unwrap();
        let mut stmt = PreparedStatement::new(&engine, info, CursorOptions::default());
        stmt.set_i32(1, 1).unwrap();
        let err = stmt.execute_update().unwrap_err();
        assert_eq!(err.to_string(), "Parameter 2 has not been bound");
        stmt.set_null(2).unwrap();
        assert_eq!(stmt.execute_update().unwrap(), UpdateCount::Rows(1));
        assert_eq!(
            engine.bound(),
            vec![BoundValue::I32(1), BoundValue::Null(EngineType::Unknown)]
        );
        assert_eq!(stmt.set_i32(3, 1).unwrap_err().kind(), ErrorKind::Range);
    }

    #[test]
    fn test_set_value_uses_declared_slot_type() {
        let engine = MockEngine::new().with_param_types(vec![
            TypeDescriptor {
                code: EngineType::Int16.code(),
                digits: 5,
                scale: 0,
            },
            TypeDescriptor {
                code: EngineType::Int64.code(),
                digits: 12,
                scale: 2,
            },
            TypeDescriptor::unknown(),
        ]);
        let info = engine.prepare("INSERT INTO t VALUES (?, ?, ?)").unwrap();
        let mut stmt = PreparedStatement::new(&engine, info, CursorOptions::default());
        stmt.set_value(1, "12").unwrap();
        stmt.set_value(2, 3i32).unwrap();
        stmt.set_value(3, 2.5f32).unwrap();
        stmt.execute_update().unwrap();
        assert_eq!(
            engine.bound(),
            vec![
                BoundValue::I16(12),
                BoundValue::Decimal {
                    unscaled: Unscaled::I16(300),
                    scale: 2
                },
                BoundValue::F32(2.5),
            ]
        );
        assert_eq!(stmt.parameter(3).unwrap(), Some(&HostValue::from(2.5f32)));
        assert_eq!(
            stmt.parameter_metadata().unwrap().parameter_type(2).unwrap(),
            SqlType::Decimal
        );
    }

    #[test]
    fn test_batch_reports_partial_progress() {
        let engine = MockEngine::new().with_params(1).failing_on_execution(3);
        let info = engine.prepare("INSERT INTO t VALUES (?)").unwrap();
        let mut stmt = PreparedStatement::new(&engine, info, CursorOptions::default());
        for v in 1..=4 {
            stmt.set_i32(1, v).unwrap();
            stmt.add_batch().unwrap();
        }
        let err = stmt.execute_batch().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Batch);
        assert_eq!(
            err.completed_updates(),
            &[UpdateCount::Rows(1), UpdateCount::Rows(1)]
        );
        assert!(err.to_string().contains("entry 2"));
        assert!(stmt.execute_batch().unwrap().is_empty());
    }

    #[test]
    fn test_close_releases_statement_once() {
        let engine = MockEngine::new().with_params(0);
        let info = engine.prepare("SELECT 1").unwrap();
        {
            let mut stmt = PreparedStatement::new(&engine, info, CursorOptions::default());
            stmt.close().unwrap();
            stmt.close().unwrap();
            assert!(stmt.execute().is_err());
        }
        assert_eq!(engine.released_statements(), 1);
    }
}
