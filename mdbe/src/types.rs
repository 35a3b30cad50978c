///
/// Type registry.
///
/// Static lookups between the three type systems this crate moves values
/// across:
/// - `EngineType`: the engine's physical column/parameter code (0..=14)
/// - `SqlType`: the relational taxonomy callers see
/// - `HostClass`: the Rust value shape an accessor hands back by default
///
/// Every table is a `match` over a closed enum, so the mappings are total
/// and need no initialization or synchronization.
///

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EngineType {
    Bool = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Int128 = 5,
    Size = 6,
    Float = 7,
    Double = 8,
    Str = 9,
    Blob = 10,
    Date = 11,
    Time = 12,
    Timestamp = 13,
    Unknown = 14,
}

impl EngineType {
    pub const ALL: [EngineType; 15] = [
        EngineType::Bool,
        EngineType::Int8,
        EngineType::Int16,
        EngineType::Int32,
        EngineType::Int64,
        EngineType::Int128,
        EngineType::Size,
        EngineType::Float,
        EngineType::Double,
        EngineType::Str,
        EngineType::Blob,
        EngineType::Date,
        EngineType::Time,
        EngineType::Timestamp,
        EngineType::Unknown,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps the engine's internal storage names. Names it does not know
    /// resolve to `Unknown` rather than failing.
    pub fn from_gdk_name(name: &str) -> Self {
        match name {
            "bit" => EngineType::Bool,
            "bte" => EngineType::Int8,
            "sht" => EngineType::Int16,
            "int" => EngineType::Int32,
            "lng" => EngineType::Int64,
            "hge" => EngineType::Int128,
            "size" | "oid" => EngineType::Size,
            "flt" => EngineType::Float,
            "dbl" => EngineType::Double,
            "str" => EngineType::Str,
            "blob" => EngineType::Blob,
            "date" => EngineType::Date,
            "daytime" => EngineType::Time,
            "timestamp" => EngineType::Timestamp,
            _ => EngineType::Unknown,
        }
    }

    pub fn gdk_name(self) -> &'static str {
        match self {
            EngineType::Bool => "bit",
            EngineType::Int8 => "bte",
            EngineType::Int16 => "sht",
            EngineType::Int32 => "int",
            EngineType::Int64 => "lng",
            EngineType::Int128 => "hge",
            EngineType::Size => "size",
            EngineType::Float => "flt",
            EngineType::Double => "dbl",
            EngineType::Str => "str",
            EngineType::Blob => "blob",
            EngineType::Date => "date",
            EngineType::Time => "daytime",
            EngineType::Timestamp => "timestamp",
            EngineType::Unknown => "unknown",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EngineType::Bool => "monetdbe_bool",
            EngineType::Int8 => "monetdbe_int8_t",
            EngineType::Int16 => "monetdbe_int16_t",
            EngineType::Int32 => "monetdbe_int32_t",
            EngineType::Int64 => "monetdbe_int64_t",
            EngineType::Int128 => "monetdbe_int128_t",
            EngineType::Size => "monetdbe_size_t",
            EngineType::Float => "monetdbe_float",
            EngineType::Double => "monetdbe_double",
            EngineType::Str => "monetdbe_str",
            EngineType::Blob => "monetdbe_blob",
            EngineType::Date => "monetdbe_date",
            EngineType::Time => "monetdbe_time",
            EngineType::Timestamp => "monetdbe_timestamp",
            EngineType::Unknown => "monetdbe_type_unknown",
        }
    }

    /// Bytes per row in a packed fixed-width buffer. `None` for the
    /// variable-width codes.
    pub fn byte_width(self) -> Option<usize> {
        match self {
            EngineType::Bool | EngineType::Int8 => Some(1),
            EngineType::Int16 => Some(2),
            EngineType::Int32 | EngineType::Size | EngineType::Float => Some(4),
            EngineType::Int64 | EngineType::Double => Some(8),
            EngineType::Int128 => Some(16),
            _ => None,
        }
    }

    pub fn is_fixed_width(self) -> bool {
        self.byte_width().is_some()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            EngineType::Int8
                | EngineType::Int16
                | EngineType::Int32
                | EngineType::Int64
                | EngineType::Int128
                | EngineType::Size
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, EngineType::Date | EngineType::Time | EngineType::Timestamp)
    }

    /// Total, non-injective projection onto the relational taxonomy.
    pub fn relational_type(self) -> SqlType {
        match self {
            EngineType::Bool => SqlType::Boolean,
            EngineType::Int8 => SqlType::TinyInt,
            EngineType::Int16 => SqlType::SmallInt,
            EngineType::Int32 | EngineType::Size => SqlType::Integer,
            EngineType::Int64 => SqlType::BigInt,
            EngineType::Int128 => SqlType::Numeric,
            EngineType::Float => SqlType::Real,
            EngineType::Double => SqlType::Double,
            EngineType::Str => SqlType::Varchar,
            EngineType::Blob => SqlType::Blob,
            EngineType::Date => SqlType::Date,
            EngineType::Time => SqlType::Time,
            EngineType::Timestamp => SqlType::Timestamp,
            EngineType::Unknown => SqlType::Null,
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Numeric,
    Real,
    Float,
    Double,
    Char,
    Varchar,
    LongVarchar,
    NChar,
    NVarchar,
    LongNVarchar,
    Clob,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Boolean,
    Date,
    Time,
    Timestamp,
    Null,
    Other,
}

impl SqlType {
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Bit => "BIT",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Decimal => "DECIMAL",
            SqlType::Numeric => "NUMERIC",
            SqlType::Real => "REAL",
            SqlType::Float => "FLOAT",
            SqlType::Double => "DOUBLE",
            SqlType::Char => "CHAR",
            SqlType::Varchar => "VARCHAR",
            SqlType::LongVarchar => "LONGVARCHAR",
            SqlType::NChar => "NCHAR",
            SqlType::NVarchar => "NVARCHAR",
            SqlType::LongNVarchar => "LONGNVARCHAR",
            SqlType::Clob => "CLOB",
            SqlType::Binary => "BINARY",
            SqlType::VarBinary => "VARBINARY",
            SqlType::LongVarBinary => "LONGVARBINARY",
            SqlType::Blob => "BLOB",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Null => "NULL",
            SqlType::Other => "OTHER",
        }
    }

    pub fn is_character(self) -> bool {
        matches!(
            self,
            SqlType::Char
                | SqlType::Varchar
                | SqlType::LongVarchar
                | SqlType::NChar
                | SqlType::NVarchar
                | SqlType::LongNVarchar
                | SqlType::Clob
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob
        )
    }

    /// Value shape handed out when the caller asks for no particular class.
    pub fn host_class(self) -> HostClass {
        match self {
            SqlType::Char
            | SqlType::Varchar
            | SqlType::LongVarchar
            | SqlType::NChar
            | SqlType::NVarchar
            | SqlType::LongNVarchar
            | SqlType::Clob => HostClass::Text,
            SqlType::Decimal | SqlType::Numeric => HostClass::Decimal,
            SqlType::Boolean => HostClass::Bool,
            SqlType::Bit | SqlType::TinyInt | SqlType::SmallInt => HostClass::I16,
            SqlType::Integer => HostClass::I32,
            SqlType::BigInt => HostClass::I64,
            SqlType::Real => HostClass::F32,
            SqlType::Float | SqlType::Double => HostClass::F64,
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary => HostClass::Bytes,
            SqlType::Blob => HostClass::Blob,
            SqlType::Date => HostClass::Date,
            SqlType::Time => HostClass::Time,
            SqlType::Timestamp => HostClass::Timestamp,
            SqlType::Null | SqlType::Other => HostClass::Text,
        }
    }

    /// Encode-direction mapping. Approximate for DECIMAL/NUMERIC, which
    /// settle on the 64-bit code; the binder picks the real width from the
    /// value itself.
    pub fn engine_type(self) -> EngineType {
        match self {
            SqlType::Boolean | SqlType::Bit => EngineType::Bool,
            SqlType::TinyInt => EngineType::Int8,
            SqlType::SmallInt => EngineType::Int16,
            SqlType::Integer => EngineType::Int32,
            SqlType::BigInt | SqlType::Decimal | SqlType::Numeric => EngineType::Int64,
            SqlType::Real | SqlType::Float => EngineType::Float,
            SqlType::Double => EngineType::Double,
            SqlType::Char
            | SqlType::Varchar
            | SqlType::LongVarchar
            | SqlType::NChar
            | SqlType::NVarchar
            | SqlType::LongNVarchar
            | SqlType::Clob => EngineType::Str,
            SqlType::Blob | SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary => {
                EngineType::Blob
            }
            SqlType::Date => EngineType::Date,
            SqlType::Time => EngineType::Time,
            SqlType::Timestamp => EngineType::Timestamp,
            SqlType::Null | SqlType::Other => EngineType::Unknown,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            SqlType::Numeric
                | SqlType::Decimal
                | SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Real
                | SqlType::Float
                | SqlType::Double
        )
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.trim().to_ascii_uppercase().as_str() {
            "BIT" => SqlType::Bit,
            "TINYINT" => SqlType::TinyInt,
            "SMALLINT" => SqlType::SmallInt,
            "INTEGER" | "INT" => SqlType::Integer,
            "BIGINT" => SqlType::BigInt,
            "DECIMAL" => SqlType::Decimal,
            "NUMERIC" => SqlType::Numeric,
            "REAL" => SqlType::Real,
            "FLOAT" => SqlType::Float,
            "DOUBLE" => SqlType::Double,
            "CHAR" => SqlType::Char,
            "VARCHAR" => SqlType::Varchar,
            "LONGVARCHAR" => SqlType::LongVarchar,
            "NCHAR" => SqlType::NChar,
            "NVARCHAR" => SqlType::NVarchar,
            "LONGNVARCHAR" => SqlType::LongNVarchar,
            "CLOB" => SqlType::Clob,
            "BINARY" => SqlType::Binary,
            "VARBINARY" => SqlType::VarBinary,
            "LONGVARBINARY" => SqlType::LongVarBinary,
            "BLOB" => SqlType::Blob,
            "BOOLEAN" => SqlType::Boolean,
            "DATE" => SqlType::Date,
            "TIME" => SqlType::Time,
            "TIMESTAMP" => SqlType::Timestamp,
            "NULL" => SqlType::Null,
            "OTHER" => SqlType::Other,
            _ => {
                return Err(Error::Parse {
                    text: s.to_string(),
                    target: "SQL type",
                })
            }
        };
        Ok(ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostClass {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    BigInt,
    Text,
    Bytes,
    Blob,
    Date,
    Time,
    Timestamp,
}

impl HostClass {
    pub fn name(self) -> &'static str {
        match self {
            HostClass::Bool => "bool",
            HostClass::I16 => "i16",
            HostClass::I32 => "i32",
            HostClass::I64 => "i64",
            HostClass::F32 => "f32",
            HostClass::F64 => "f64",
            HostClass::Decimal => "rust_decimal::Decimal",
            HostClass::BigInt => "i128",
            HostClass::Text => "String",
            HostClass::Bytes => "Vec<u8>",
            HostClass::Blob => "mdbe::Blob",
            HostClass::Date => "chrono::NaiveDate",
            HostClass::Time => "chrono::NaiveTime",
            HostClass::Timestamp => "chrono::NaiveDateTime",
        }
    }

    /// Relational type assumed for a value bound to a slot whose declared
    /// type the engine could not report.
    pub fn default_sql_type(self) -> SqlType {
        match self {
            HostClass::Bool => SqlType::Boolean,
            HostClass::I16 => SqlType::SmallInt,
            HostClass::I32 => SqlType::Integer,
            HostClass::I64 => SqlType::BigInt,
            HostClass::F32 => SqlType::Real,
            HostClass::F64 => SqlType::Double,
            HostClass::Decimal => SqlType::Decimal,
            HostClass::BigInt => SqlType::Numeric,
            HostClass::Text => SqlType::Varchar,
            HostClass::Bytes => SqlType::VarBinary,
            HostClass::Blob => SqlType::Blob,
            HostClass::Date => SqlType::Date,
            HostClass::Time => SqlType::Time,
            HostClass::Timestamp => SqlType::Timestamp,
        }
    }
}

/// Whether a column of engine type `ty` may be read as `class`.
pub fn can_convert(ty: EngineType, class: HostClass) -> bool {
    use EngineType as E;
    match class {
        HostClass::Text => !matches!(ty, E::Blob | E::Unknown),
        HostClass::Bool
        | HostClass::I16
        | HostClass::I32
        | HostClass::I64
        | HostClass::F32
        | HostClass::F64
        | HostClass::Decimal => (0..=9).contains(&ty.code()),
        HostClass::BigInt => matches!(ty, E::Int64 | E::Int128 | E::Str),
        HostClass::Bytes | HostClass::Blob => ty == E::Blob,
        HostClass::Date => matches!(ty, E::Str | E::Date | E::Timestamp),
        HostClass::Time => matches!(ty, E::Str | E::Time | E::Timestamp),
        HostClass::Timestamp => matches!(ty, E::Str | E::Date | E::Time | E::Timestamp),
    }
}
