///
/// Declared column types.
///
/// SQLite keeps the type text a column was declared with. That text picks
/// the engine code the column is packed as; DECIMAL(p,s) and NUMERIC(p,s)
/// become scaled integers. Columns without a usable declaration (computed
/// expressions) are typed from their values instead.
///

use mdbe::EngineType;
use rusqlite::types::Value;

/// Digits above which a decimal no longer fits the 64-bit code.
const MAX_INT64_DIGITS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declared {
    pub engine_type: EngineType,
    pub digits: u32,
    pub scale: u32,
}

impl Declared {
    fn plain(engine_type: EngineType) -> Self {
        Self {
            engine_type,
            digits: 0,
            scale: 0,
        }
    }

    /// Scale in the engine's `10^s` form.
    pub fn stored_scale(&self) -> f64 {
        10f64.powi(self.scale as i32)
    }
}

fn decimal(args: Option<&str>) -> Declared {
    let mut numbers = args
        .into_iter()
        .flat_map(|a| a.split(','))
        .map(|n| n.trim().parse::<u32>().ok());
    let digits = numbers.next().flatten().unwrap_or(MAX_INT64_DIGITS);
    let scale = numbers.next().flatten().unwrap_or(0);
    let engine_type = if digits > MAX_INT64_DIGITS {
        EngineType::Int128
    } else {
        EngineType::Int64
    };
    Declared {
        engine_type,
        digits,
        scale,
    }
}

/// Maps a declaration such as `VARCHAR(20)` or `DECIMAL(10,2)`. `None`
/// when the name is not recognised.
pub fn from_decl(decl: &str) -> Option<Declared> {
    let upper = decl.trim().to_ascii_uppercase();
    let (name, args) = match upper.split_once('(') {
        Some((name, rest)) => (name.trim(), Some(rest.trim_end_matches(')'))),
        None => (upper.as_str(), None),
    };
    let declared = match name {
        "BOOL" | "BOOLEAN" => Declared::plain(EngineType::Bool),
        "TINYINT" => Declared::plain(EngineType::Int8),
        "SMALLINT" | "INT2" => Declared::plain(EngineType::Int16),
        "INT" | "INTEGER" | "MEDIUMINT" | "INT4" => Declared::plain(EngineType::Int32),
        "BIGINT" | "INT8" => Declared::plain(EngineType::Int64),
        "HUGEINT" => Declared::plain(EngineType::Int128),
        "DECIMAL" | "NUMERIC" => decimal(args),
        "REAL" => Declared::plain(EngineType::Float),
        "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" => Declared::plain(EngineType::Double),
        "CHAR" | "CHARACTER" | "VARCHAR" | "CHARACTER VARYING" | "NCHAR" | "NVARCHAR"
        | "TEXT" | "CLOB" | "STRING" => Declared::plain(EngineType::Str),
        "BLOB" | "BINARY" | "VARBINARY" => Declared::plain(EngineType::Blob),
        "DATE" => Declared::plain(EngineType::Date),
        "TIME" => Declared::plain(EngineType::Time),
        "TIMESTAMP" | "DATETIME" => Declared::plain(EngineType::Timestamp),
        _ => return None,
    };
    Some(declared)
}

/// Type of an undeclared column, from its first non-null value.
pub fn infer(values: impl IntoIterator<Item = impl std::borrow::Borrow<Value>>) -> Declared {
    for value in values {
        let engine_type = match value.borrow() {
            Value::Null => continue,
            Value::Integer(_) => EngineType::Int64,
            Value::Real(_) => EngineType::Double,
            Value::Text(_) => EngineType::Str,
            Value::Blob(_) => EngineType::Blob,
        };
        return Declared::plain(engine_type);
    }
    Declared::plain(EngineType::Str)
}
