///
/// Native engine boundary.
///
/// The engine on the other side is consumed through the `Engine` trait: a
/// blocking, error-string-or-value interface that hands out opaque result
/// and prepared-statement handles. Results come back in one bulk transfer
/// as `RawColumn`s laid out the way the engine stores them:
/// - codes 0..=8: one packed little-endian buffer, `byte_width` bytes per row
/// - codes 9..=14: one boxed value per row, `None` for SQL NULL
///
/// Implementations own the session handle. Every method blocks until the
/// engine returns; no locking is added on this side of the boundary, so an
/// engine shared between threads must be re-entrant on its own.
///

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::types::EngineType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type NativeResult<T> = std::result::Result<T, NativeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultHandle(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(pub i64);

/// Affected-row count of one executed statement. `Unknown` is the
/// "succeeded, no count available" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCount {
    Rows(u64),
    Unknown,
}

impl fmt::Display for UpdateCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateCount::Rows(n) => write!(f, "{}", n),
            UpdateCount::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows {
        result: ResultHandle,
        rows: usize,
        columns: usize,
    },
    Affected(UpdateCount),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    /// `scale` is the engine's decimal multiplier, `10^s` for a column with
    /// `s` fractional digits. `nulls`, when present, marks rows whose
    /// storage has been zeroed.
    Fixed {
        bytes: Vec<u8>,
        scale: f64,
        nulls: Option<Vec<bool>>,
    },
    Var(Vec<Option<VarValue>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub code: i32,
    /// Declared decimal digits, 0 when the engine reports none.
    pub digits: u32,
    pub data: RawData,
}

/// Declared type of a parameter slot or result column as reported by
/// prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub code: i32,
    pub digits: u32,
    pub scale: u32,
}

impl TypeDescriptor {
    pub fn unknown() -> Self {
        Self {
            code: EngineType::Unknown.code(),
            digits: 0,
            scale: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInfo {
    pub handle: StatementHandle,
    pub params: Vec<TypeDescriptor>,
    pub columns: Vec<ColumnDescriptor>,
}

/// Unscaled integer of a bound decimal, in the narrowest width that holds
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unscaled {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
}

impl Unscaled {
    pub fn narrowest(value: i128) -> Self {
        if let Ok(v) = i8::try_from(value) {
            Unscaled::I8(v)
        } else if let Ok(v) = i16::try_from(value) {
            Unscaled::I16(v)
        } else if let Ok(v) = i32::try_from(value) {
            Unscaled::I32(v)
        } else if let Ok(v) = i64::try_from(value) {
            Unscaled::I64(v)
        } else {
            Unscaled::I128(value)
        }
    }

    pub fn value(self) -> i128 {
        match self {
            Unscaled::I8(v) => v as i128,
            Unscaled::I16(v) => v as i128,
            Unscaled::I32(v) => v as i128,
            Unscaled::I64(v) => v as i128,
            Unscaled::I128(v) => v,
        }
    }

    pub fn engine_type(self) -> EngineType {
        match self {
            Unscaled::I8(_) => EngineType::Int8,
            Unscaled::I16(_) => EngineType::Int16,
            Unscaled::I32(_) => EngineType::Int32,
            Unscaled::I64(_) => EngineType::Int64,
            Unscaled::I128(_) => EngineType::Int128,
        }
    }

    pub fn to_le_bytes(self) -> Vec<u8> {
        match self {
            Unscaled::I8(v) => v.to_le_bytes().to_vec(),
            Unscaled::I16(v) => v.to_le_bytes().to_vec(),
            Unscaled::I32(v) => v.to_le_bytes().to_vec(),
            Unscaled::I64(v) => v.to_le_bytes().to_vec(),
            Unscaled::I128(v) => v.to_le_bytes().to_vec(),
        }
    }
}

/// One engine-level bind call. Nulls stay typed.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Null(EngineType),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    F32(f32),
    F64(f64),
    Str(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Decimal { unscaled: Unscaled, scale: u32 },
}

impl BoundValue {
    pub fn engine_type(&self) -> EngineType {
        match self {
            BoundValue::Null(ty) => *ty,
            BoundValue::Bool(_) => EngineType::Bool,
            BoundValue::I8(_) => EngineType::Int8,
            BoundValue::I16(_) => EngineType::Int16,
            BoundValue::I32(_) => EngineType::Int32,
            BoundValue::I64(_) => EngineType::Int64,
            BoundValue::I128(_) => EngineType::Int128,
            BoundValue::F32(_) => EngineType::Float,
            BoundValue::F64(_) => EngineType::Double,
            BoundValue::Str(_) => EngineType::Str,
            BoundValue::Blob(_) => EngineType::Blob,
            BoundValue::Date(_) => EngineType::Date,
            BoundValue::Time(_) => EngineType::Time,
            BoundValue::Timestamp(_) => EngineType::Timestamp,
            BoundValue::Decimal { unscaled, .. } => unscaled.engine_type(),
        }
    }
}

pub trait Engine: Send {
    /// Runs SQL text. `max_rows` of 0 means no limit.
    fn execute(&self, sql: &str, max_rows: u64) -> NativeResult<Outcome>;

    fn prepare(&self, sql: &str) -> NativeResult<PreparedInfo>;

    /// Binds one value to a 0-based parameter slot.
    fn bind(&self, stmt: StatementHandle, index: usize, value: &BoundValue) -> NativeResult<()>;

    fn clear_bindings(&self, stmt: StatementHandle) -> NativeResult<()>;

    fn execute_prepared(&self, stmt: StatementHandle, max_rows: u64) -> NativeResult<Outcome>;

    /// Transfers every column of a result in one call.
    fn fetch_all(
        &self,
        result: ResultHandle,
        rows: usize,
        columns: usize,
    ) -> NativeResult<Vec<RawColumn>>;

    fn release_result(&self, result: ResultHandle) -> NativeResult<()>;

    fn release_statement(&self, stmt: StatementHandle) -> NativeResult<()>;

    fn autocommit(&self) -> NativeResult<bool>;

    fn set_autocommit(&self, enabled: bool) -> NativeResult<()>;

    fn close(&mut self) -> NativeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrowest_unscaled_width() {
        assert_eq!(Unscaled::narrowest(0), Unscaled::I8(0));
        assert_eq!(Unscaled::narrowest(127), Unscaled::I8(127));
        assert_eq!(Unscaled::narrowest(128), Unscaled::I16(128));
        assert_eq!(Unscaled::narrowest(-32_769), Unscaled::I32(-32_769));
        assert_eq!(
            Unscaled::narrowest(i32::MAX as i128 + 1),
            Unscaled::I64(i32::MAX as i64 + 1)
        );
        assert_eq!(
            Unscaled::narrowest(i64::MIN as i128 - 1),
            Unscaled::I128(i64::MIN as i128 - 1)
        );
    }

    #[test]
    fn test_unscaled_bytes_follow_width() {
        for v in [5i128, -300, 70_000, 1 << 40, 1 << 100] {
            let u = Unscaled::narrowest(v);
            assert_eq!(u.value(), v);
            assert_eq!(Some(u.to_le_bytes().len()), u.engine_type().byte_width());
        }
    }

    #[test]
    fn test_bound_value_types() {
        assert_eq!(
            BoundValue::Null(EngineType::Date).engine_type(),
            EngineType::Date
        );
        assert_eq!(
            BoundValue::Decimal {
                unscaled: Unscaled::I16(1234),
                scale: 2
            }
            .engine_type(),
            EngineType::Int16
        );
    }

    #[test]
    fn test_update_count_display() {
        assert_eq!(UpdateCount::Rows(3).to_string(), "3");
        assert_eq!(UpdateCount::Unknown.to_string(), "unknown");
    }
}
