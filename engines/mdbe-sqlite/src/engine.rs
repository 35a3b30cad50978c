///
/// SQLite implementation of the native engine boundary.
///
/// Uses two handle registries:
/// - results: i64 handle -> packed columns of one materialized result
/// - statements: i64 handle -> SQL text plus its staged parameter values
///
/// Results are read to the end (or to `max_rows`) as soon as a statement
/// runs, then packed column by column into the layout the decoder expects:
/// little-endian fixed-width buffers with a null mask for integer codes,
/// NaN for null floats, boxed values for everything else. A result's
/// columns can be transferred once; the handle stays valid until released.
///
/// Prepared statements keep their SQL and re-acquire the compiled statement
/// from the connection's statement cache on each execution.
///
/// Manual-commit mode is emulated: the adapter keeps a transaction open and
/// starts a new one after every COMMIT or ROLLBACK.
///

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use mdbe::value::{format_unscaled, parse_bool, DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use mdbe::{
    BoundValue, ColumnDescriptor, Engine, EngineType, NativeError, NativeResult, Outcome,
    PreparedInfo, RawColumn, RawData, ResultHandle, SessionOptions, StatementHandle,
    TypeDescriptor, UpdateCount, VarValue,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Statement};
use rust_decimal::Decimal;
use tracing::{debug, info, trace};

use crate::decltype::{self, Declared};

/// File created inside a session directory.
pub const DATABASE_FILE: &str = "mdbe.sqlite3";

fn native(e: rusqlite::Error) -> NativeError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) => {
            NativeError::new(format!("{} (code {})", e, err.extended_code))
        }
        _ => NativeError::new(e.to_string()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> NativeResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| NativeError::new("engine state poisoned by a panicking thread"))
}

struct Registry<T> {
    entries: HashMap<i64, T>,
    next_id: i64,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, entry: T) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }
}

struct PreparedSql {
    sql: String,
    params: Vec<Value>,
}

pub struct SqliteEngine {
    conn: Option<Connection>,
    results: Mutex<Registry<Option<Vec<RawColumn>>>>,
    statements: Mutex<Registry<PreparedSql>>,
    manual: Mutex<bool>,
}

impl SqliteEngine {
    /// Opens the database named by `options`: in memory, or
    /// `<directory>/mdbe.sqlite3` with the directory created if missing.
    pub fn open(options: &SessionOptions) -> NativeResult<Self> {
        let conn = match &options.directory {
            None => Connection::open_in_memory().map_err(native)?,
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    NativeError::new(format!("cannot create {}: {}", dir.display(), e))
                })?;
                Connection::open(dir.join(DATABASE_FILE)).map_err(native)?
            }
        };

        if options.query_timeout > 0 {
            conn.busy_timeout(Duration::from_secs(options.query_timeout))
                .map_err(native)?;
        }
        if options.memory_limit > 0 {
            // Negative cache_size is in KiB.
            let kib = i64::try_from(options.memory_limit.saturating_mul(1024)).unwrap_or(i64::MAX);
            conn.pragma_update(None, "cache_size", -kib).map_err(native)?;
        }
        if options.nr_threads > 0 {
            let threads: i64 = conn
                .pragma_update_and_check(None, "threads", options.nr_threads as i64, |row| {
                    row.get(0)
                })
                .map_err(native)?;
            debug!(threads, "worker threads set");
        }
        if options.session_timeout > 0 {
            debug!(
                session_timeout = options.session_timeout,
                "session timeout has no SQLite counterpart, ignored"
            );
        }
        if let Some(log_file) = &options.log_file {
            trace!(log_file = %log_file.display(), "engine log file requested");
        }

        let location = options.directory.as_ref().map_or_else(
            || ":memory:".to_string(),
            |d| d.join(DATABASE_FILE).display().to_string(),
        );
        info!(location = %location, "sqlite database opened");
        Ok(Self {
            conn: Some(conn),
            results: Mutex::new(Registry::new()),
            statements: Mutex::new(Registry::new()),
            manual: Mutex::new(false),
        })
    }

    fn conn(&self) -> NativeResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| NativeError::new("database is closed"))
    }

    /// Reopens the emulated transaction after COMMIT or ROLLBACK ended it.
    fn resume_transaction(&self) -> NativeResult<()> {
        let conn = self.conn()?;
        if *lock(&self.manual)? && conn.is_autocommit() {
            trace!("beginning transaction");
            conn.execute_batch("BEGIN").map_err(native)?;
        }
        Ok(())
    }

    fn run(&self, stmt: &mut Statement<'_>, sql: &str, max_rows: u64) -> NativeResult<Outcome> {
        if stmt.column_count() == 0 {
            let changed = stmt.raw_execute().map_err(native)?;
            self.resume_transaction()?;
            let count = if is_dml(sql) { changed as u64 } else { 0 };
            return Ok(Outcome::Affected(UpdateCount::Rows(count)));
        }

        let headers: Vec<(String, Option<Declared>)> = stmt
            .columns()
            .iter()
            .map(|c| {
                (
                    c.name().to_string(),
                    c.decl_type().and_then(decltype::from_decl),
                )
            })
            .collect();
        let limit = usize::try_from(max_rows).ok().filter(|m| *m > 0);

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        let mut count = 0usize;
        let mut rows = stmt.raw_query();
        while limit.is_none_or(|limit| count < limit) {
            let Some(row) = rows.next().map_err(native)? else {
                break;
            };
            for (i, column) in values.iter_mut().enumerate() {
                column.push(Value::from(row.get_ref(i).map_err(native)?));
            }
            count += 1;
        }
        drop(rows);

        let width = headers.len();
        let columns = headers
            .into_iter()
            .zip(values)
            .map(|((name, declared), values)| {
                let declared = declared.unwrap_or_else(|| decltype::infer(&values));
                pack(name, declared, values)
            })
            .collect::<NativeResult<Vec<_>>>()?;
        let id = lock(&self.results)?.insert(Some(columns));
        debug!(handle = id, rows = count, columns = width, "result materialized");
        Ok(Outcome::Rows {
            result: ResultHandle(id),
            rows: count,
            columns: width,
        })
    }
}

fn is_dml(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or("");
    ["INSERT", "UPDATE", "DELETE", "REPLACE", "WITH"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

fn refused(name: &str, row: usize, value: &Value, ty: EngineType) -> NativeError {
    NativeError::new(format!(
        "column '{}' row {}: cannot store {:?} as {}",
        name, row, value, ty
    ))
}

/// Decimals at or above this many unscaled units are stored as BLOB text.
/// NUMERIC affinity turns numeric-looking TEXT into REAL, which keeps only
/// 15 significant digits; BLOBs are never converted.
const EXACT_REAL_LIMIT: u128 = 10u128.pow(f64::DIGITS);

/// Storage value of a decimal with `scale` fractional digits.
fn decimal_value(unscaled: i128, scale: u32) -> Value {
    if scale == 0 {
        if let Ok(v) = i64::try_from(unscaled) {
            return Value::Integer(v);
        }
    }
    let text = format_unscaled(unscaled, scale);
    if unscaled.unsigned_abs() < EXACT_REAL_LIMIT {
        Value::Text(text)
    } else {
        Value::Blob(text.into_bytes())
    }
}

/// Exact unscaled integer of a plain decimal literal. Fraction digits past
/// `scale` round half away from zero.
fn parse_unscaled(text: &str, scale: u32) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let keep = fraction.len().min(scale as usize);
    let mut v: i128 = 0;
    for b in whole.bytes().chain(fraction[..keep].bytes()) {
        v = v.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    v = v.checked_mul(10i128.checked_pow(scale - keep as u32)?)?;
    if fraction.as_bytes().get(keep).is_some_and(|b| *b >= b'5') {
        v = v.checked_add(1)?;
    }
    Some(if negative { -v } else { v })
}

fn parse_decimal(text: &str, scale: u32) -> Option<i128> {
    let text = text.trim();
    parse_unscaled(text, scale).or_else(|| {
        let mut decimal = Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok()?;
        decimal.rescale(scale);
        // rescale stops short when the mantissa would overflow
        (decimal.scale() == scale).then(|| decimal.mantissa())
    })
}

fn significant_digits(text: &str) -> usize {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

/// Unscaled integer of `value` at `scale` fractional digits. A REAL whose
/// shortest form needs more digits than a double carries exactly is refused.
fn unscaled(value: &Value, scale: u32) -> Option<i128> {
    match value {
        Value::Null => None,
        Value::Integer(i) => 10i128.checked_pow(scale)?.checked_mul(*i as i128),
        Value::Real(f) => {
            let text = f.is_finite().then(|| f.to_string())?;
            if significant_digits(&text) > f64::DIGITS as usize {
                return None;
            }
            parse_unscaled(&text, scale)
        }
        Value::Text(s) => parse_decimal(s, scale),
        Value::Blob(b) => parse_decimal(std::str::from_utf8(b).ok()?, scale),
    }
}

fn push_le(bytes: &mut Vec<u8>, ty: EngineType, v: i128) -> Option<()> {
    match ty {
        EngineType::Bool | EngineType::Int8 => bytes.extend(i8::try_from(v).ok()?.to_le_bytes()),
        EngineType::Int16 => bytes.extend(i16::try_from(v).ok()?.to_le_bytes()),
        EngineType::Int32 | EngineType::Size => bytes.extend(i32::try_from(v).ok()?.to_le_bytes()),
        EngineType::Int64 => bytes.extend(i64::try_from(v).ok()?.to_le_bytes()),
        _ => bytes.extend(v.to_le_bytes()),
    }
    Some(())
}

fn pack_integers(name: &str, declared: Declared, values: &[Value]) -> NativeResult<RawData> {
    let ty = declared.engine_type;
    let width = ty.byte_width().unwrap_or(8);
    let mut bytes = Vec::with_capacity(values.len() * width);
    let mut nulls = vec![false; values.len()];
    for (row, value) in values.iter().enumerate() {
        let v = match (ty, value) {
            (_, Value::Null) => {
                nulls[row] = true;
                0
            }
            (EngineType::Bool, Value::Integer(i)) => (*i != 0) as i128,
            (EngineType::Bool, Value::Real(f)) => (*f != 0.0) as i128,
            (EngineType::Bool, Value::Text(s)) => {
                parse_bool(s).map_err(|_| refused(name, row, value, ty))? as i128
            }
            _ => unscaled(value, declared.scale).ok_or_else(|| refused(name, row, value, ty))?,
        };
        push_le(&mut bytes, ty, v).ok_or_else(|| refused(name, row, value, ty))?;
    }
    Ok(RawData::Fixed {
        bytes,
        scale: declared.stored_scale(),
        nulls: nulls.iter().any(|n| *n).then_some(nulls),
    })
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(f64::NAN),
        Value::Integer(i) => Some(*i as f64),
        Value::Real(f) => Some(*f),
        Value::Text(s) => s.trim().parse().ok(),
        Value::Blob(_) => None,
    }
}

fn pack(name: String, declared: Declared, values: Vec<Value>) -> NativeResult<RawColumn> {
    let ty = declared.engine_type;
    let data = match ty {
        EngineType::Bool
        | EngineType::Int8
        | EngineType::Int16
        | EngineType::Int32
        | EngineType::Int64
        | EngineType::Int128
        | EngineType::Size => pack_integers(&name, declared, &values)?,
        EngineType::Float | EngineType::Double => {
            let mut bytes = Vec::new();
            for (row, value) in values.iter().enumerate() {
                let v = to_f64(value).ok_or_else(|| refused(&name, row, value, ty))?;
                if ty == EngineType::Float {
                    bytes.extend((v as f32).to_le_bytes());
                } else {
                    bytes.extend(v.to_le_bytes());
                }
            }
            RawData::Fixed {
                bytes,
                scale: 0.0,
                nulls: None,
            }
        }
        EngineType::Blob => RawData::Var(
            values
                .into_iter()
                .enumerate()
                .map(|(row, value)| match value {
                    Value::Null => Ok(None),
                    Value::Blob(b) => Ok(Some(VarValue::Blob(b))),
                    Value::Text(s) => Ok(Some(VarValue::Blob(s.into_bytes()))),
                    other => Err(refused(&name, row, &other, ty)),
                })
                .collect::<NativeResult<_>>()?,
        ),
        EngineType::Str
        | EngineType::Date
        | EngineType::Time
        | EngineType::Timestamp
        | EngineType::Unknown => RawData::Var(
            values
                .into_iter()
                .enumerate()
                .map(|(row, value)| match value {
                    Value::Null => Ok(None),
                    Value::Text(s) => Ok(Some(VarValue::Text(s))),
                    Value::Integer(i) if ty == EngineType::Str => {
                        Ok(Some(VarValue::Text(i.to_string())))
                    }
                    Value::Real(f) if ty == EngineType::Str => {
                        Ok(Some(VarValue::Text(f.to_string())))
                    }
                    Value::Blob(b) if ty == EngineType::Str => match String::from_utf8(b) {
                        Ok(s) => Ok(Some(VarValue::Text(s))),
                        Err(e) => Err(refused(&name, row, &Value::Blob(e.into_bytes()), ty)),
                    },
                    other => Err(refused(&name, row, &other, ty)),
                })
                .collect::<NativeResult<_>>()?,
        ),
    };
    let code = if ty == EngineType::Unknown {
        EngineType::Str.code()
    } else {
        ty.code()
    };
    Ok(RawColumn {
        name,
        code,
        digits: declared.digits,
        data,
    })
}

fn to_value(value: &BoundValue) -> Value {
    match value {
        BoundValue::Null(_) => Value::Null,
        BoundValue::Bool(b) => Value::Integer(if *b { 1 } else { 0 }),
        BoundValue::I8(v) => Value::Integer(*v as i64),
        BoundValue::I16(v) => Value::Integer(*v as i64),
        BoundValue::I32(v) => Value::Integer(*v as i64),
        BoundValue::I64(v) => Value::Integer(*v),
        BoundValue::I128(v) => decimal_value(*v, 0),
        BoundValue::F32(v) => Value::Real(*v as f64),
        BoundValue::F64(v) => Value::Real(*v),
        BoundValue::Str(s) => Value::Text(s.clone()),
        BoundValue::Blob(b) => Value::Blob(b.clone()),
        BoundValue::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        BoundValue::Time(t) => Value::Text(t.format(TIME_FORMAT).to_string()),
        BoundValue::Timestamp(ts) => Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        BoundValue::Decimal { unscaled, scale } => decimal_value(unscaled.value(), *scale),
    }
}

fn unknown_statement(stmt: StatementHandle) -> NativeError {
    NativeError::new(format!("unknown statement handle {}", stmt.0))
}

impl Engine for SqliteEngine {
    fn execute(&self, sql: &str, max_rows: u64) -> NativeResult<Outcome> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(native)?;
        self.run(&mut stmt, sql, max_rows)
    }

    fn prepare(&self, sql: &str) -> NativeResult<PreparedInfo> {
        let conn = self.conn()?;
        let stmt = conn.prepare_cached(sql).map_err(native)?;
        let count = stmt.parameter_count();
        let columns = stmt
            .columns()
            .iter()
            .map(|c| ColumnDescriptor {
                name: c.name().to_string(),
                ty: match c.decl_type().and_then(decltype::from_decl) {
                    Some(d) => TypeDescriptor {
                        code: d.engine_type.code(),
                        digits: d.digits,
                        scale: d.scale,
                    },
                    None => TypeDescriptor::unknown(),
                },
            })
            .collect();
        drop(stmt);

        let id = lock(&self.statements)?.insert(PreparedSql {
            sql: sql.to_string(),
            params: vec![Value::Null; count],
        });
        debug!(handle = id, params = count, "statement prepared");
        Ok(PreparedInfo {
            handle: StatementHandle(id),
            params: vec![TypeDescriptor::unknown(); count],
            columns,
        })
    }

    fn bind(&self, stmt: StatementHandle, index: usize, value: &BoundValue) -> NativeResult<()> {
        let mut statements = lock(&self.statements)?;
        let entry = statements
            .entries
            .get_mut(&stmt.0)
            .ok_or_else(|| unknown_statement(stmt))?;
        let count = entry.params.len();
        let slot = entry.params.get_mut(index).ok_or_else(|| {
            NativeError::new(format!(
                "parameter {} out of range ({} parameters)",
                index, count
            ))
        })?;
        *slot = to_value(value);
        Ok(())
    }

    fn clear_bindings(&self, stmt: StatementHandle) -> NativeResult<()> {
        let mut statements = lock(&self.statements)?;
        let entry = statements
            .entries
            .get_mut(&stmt.0)
            .ok_or_else(|| unknown_statement(stmt))?;
        entry.params.iter_mut().for_each(|p| *p = Value::Null);
        Ok(())
    }

    fn execute_prepared(&self, stmt: StatementHandle, max_rows: u64) -> NativeResult<Outcome> {
        let (sql, params) = {
            let statements = lock(&self.statements)?;
            let entry = statements
                .entries
                .get(&stmt.0)
                .ok_or_else(|| unknown_statement(stmt))?;
            (entry.sql.clone(), entry.params.clone())
        };
        let conn = self.conn()?;
        let mut prepared = conn.prepare_cached(&sql).map_err(native)?;
        for (i, value) in params.iter().enumerate() {
            prepared.raw_bind_parameter(i + 1, value).map_err(native)?;
        }
        self.run(&mut prepared, &sql, max_rows)
    }

    fn fetch_all(
        &self,
        result: ResultHandle,
        rows: usize,
        columns: usize,
    ) -> NativeResult<Vec<RawColumn>> {
        let mut results = lock(&self.results)?;
        let entry = results
            .entries
            .get_mut(&result.0)
            .ok_or_else(|| NativeError::new(format!("unknown result handle {}", result.0)))?;
        let fetched = entry
            .take()
            .ok_or_else(|| NativeError::new(format!("result {} already transferred", result.0)))?;
        trace!(handle = result.0, rows, columns, "columns transferred");
        Ok(fetched)
    }

    fn release_result(&self, result: ResultHandle) -> NativeResult<()> {
        lock(&self.results)?
            .entries
            .remove(&result.0)
            .map(|_| ())
            .ok_or_else(|| NativeError::new(format!("unknown result handle {}", result.0)))
    }

    fn release_statement(&self, stmt: StatementHandle) -> NativeResult<()> {
        lock(&self.statements)?
            .entries
            .remove(&stmt.0)
            .map(|_| ())
            .ok_or_else(|| unknown_statement(stmt))
    }

    fn autocommit(&self) -> NativeResult<bool> {
        Ok(!*lock(&self.manual)?)
    }

    fn set_autocommit(&self, enabled: bool) -> NativeResult<()> {
        let conn = self.conn()?;
        let mut manual = lock(&self.manual)?;
        if enabled && *manual {
            if !conn.is_autocommit() {
                conn.execute_batch("COMMIT").map_err(native)?;
            }
            *manual = false;
        } else if !enabled && !*manual {
            if conn.is_autocommit() {
                conn.execute_batch("BEGIN").map_err(native)?;
            }
            *manual = true;
        }
        debug!(autocommit = enabled, "commit mode changed");
        Ok(())
    }

    fn close(&mut self) -> NativeResult<()> {
        if let Some(conn) = self.conn.take() {
            lock(&self.results)?.entries.clear();
            lock(&self.statements)?.entries.clear();
            conn.close().map_err(|(_, e)| native(e))?;
            debug!("sqlite database closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdbe::Unscaled;

    fn engine() -> SqliteEngine {
        SqliteEngine::open(&SessionOptions::in_memory()).unwrap()
    }

    #[test]
    fn test_dml_detection() {
        assert!(is_dml("insert into t values (1)"));
        assert!(is_dml("  DELETE FROM t"));
        assert!(!is_dml("CREATE TABLE t (x INT)"));
        assert!(!is_dml("COMMIT"));
    }

    #[test]
    fn test_unscaled_conversion() {
        assert_eq!(unscaled(&Value::Integer(12), 2), Some(1200));
        assert_eq!(unscaled(&Value::Real(12.5), 2), Some(1250));
        assert_eq!(unscaled(&Value::Text("-0.07".into()), 3), Some(-70));
        assert_eq!(unscaled(&Value::Blob(vec![1]), 0), None);
        assert_eq!(unscaled(&Value::Text("2.345".into()), 2), Some(235));
        assert_eq!(unscaled(&Value::Text("-2.345".into()), 2), Some(-235));
        assert_eq!(unscaled(&Value::Text("1.5e2".into()), 1), Some(1500));
        assert_eq!(
            unscaled(&Value::Blob(b"1234567890123456789012.3456".to_vec()), 4),
            Some(12345678901234567890123456)
        );
    }

    #[test]
    fn test_lossy_reals_are_refused() {
        assert_eq!(unscaled(&Value::Real(0.1), 2), Some(10));
        assert_eq!(unscaled(&Value::Real(123456789012.34), 2), Some(12345678901234));
        let wide: f64 = "1234567890123456.78".parse().unwrap();
        assert_eq!(unscaled(&Value::Real(wide), 2), None);
        assert_eq!(unscaled(&Value::Real(f64::NAN), 0), None);
        assert_eq!(unscaled(&Value::Real(f64::INFINITY), 0), None);
    }

    #[test]
    fn test_rescale_past_decimal_range_is_refused() {
        // 26 digits at scale 4 needs a mantissa wider than 96 bits
        assert_eq!(parse_decimal("1.2345678901234567890123456e25", 4), None);
        assert_eq!(parse_decimal("1.5e2", 40), None);
    }

    #[test]
    fn test_bound_values_become_sqlite_values() {
        assert_eq!(to_value(&BoundValue::Bool(true)), Value::Integer(1));
        assert_eq!(
            to_value(&BoundValue::Decimal {
                unscaled: Unscaled::I16(1250),
                scale: 2
            }),
            Value::Text("12.50".into())
        );
        assert_eq!(
            to_value(&BoundValue::Decimal {
                unscaled: Unscaled::I8(7),
                scale: 0
            }),
            Value::Integer(7)
        );
        assert_eq!(
            to_value(&BoundValue::Decimal {
                unscaled: Unscaled::I64(123456789012345678),
                scale: 2
            }),
            Value::Blob(b"1234567890123456.78".to_vec())
        );
        assert_eq!(
            to_value(&BoundValue::I128(i128::from(i64::MAX) + 1)),
            Value::Blob(b"9223372036854775808".to_vec())
        );
        assert_eq!(to_value(&BoundValue::Null(EngineType::Int32)), Value::Null);
    }

    #[test]
    fn test_integer_column_packing() {
        let engine = engine();
        engine
            .execute("CREATE TABLE t (a SMALLINT, b DECIMAL(8,2))", 0)
            .unwrap();
        engine
            .execute("INSERT INTO t VALUES (1, 2.5), (NULL, NULL)", 0)
            .unwrap();
        let Outcome::Rows {
            result,
            rows,
            columns,
        } = engine.execute("SELECT a, b FROM t", 0).unwrap()
        else {
            panic!("expected rows");
        };
        assert_eq!((rows, columns), (2, 2));
        let raw = engine.fetch_all(result, rows, columns).unwrap();
        assert_eq!(raw[0].code, EngineType::Int16.code());
        assert_eq!(
            raw[0].data,
            RawData::Fixed {
                bytes: vec![1, 0, 0, 0],
                scale: 1.0,
                nulls: Some(vec![false, true]),
            }
        );
        assert_eq!(raw[1].code, EngineType::Int64.code());
        let RawData::Fixed { bytes, scale, .. } = &raw[1].data else {
            panic!("expected fixed-width data");
        };
        assert_eq!(*scale, 100.0);
        assert_eq!(&bytes[..8], &250i64.to_le_bytes());

        assert!(engine.fetch_all(result, rows, columns).is_err());
        engine.release_result(result).unwrap();
        assert!(engine.release_result(result).is_err());
    }

    #[test]
    fn test_out_of_range_value_is_refused() {
        let engine = engine();
        engine.execute("CREATE TABLE t (a TINYINT)", 0).unwrap();
        engine.execute("INSERT INTO t VALUES (1000)", 0).unwrap();
        let err = engine.execute("SELECT a FROM t", 0).unwrap_err();
        assert!(err.to_string().contains("cannot store"));
    }

    #[test]
    fn test_wide_real_literal_in_decimal_column_is_refused() {
        let engine = engine();
        engine.execute("CREATE TABLE t (d DECIMAL(18,2))", 0).unwrap();
        engine
            .execute("INSERT INTO t VALUES (1234567890123456.78)", 0)
            .unwrap();
        let err = engine.execute("SELECT d FROM t", 0).unwrap_err();
        assert!(err.to_string().contains("cannot store"));
    }

    #[test]
    fn test_closed_engine_refuses_work() {
        let mut engine = engine();
        engine.close().unwrap();
        engine.close().unwrap();
        let err = engine.execute("SELECT 1", 0).unwrap_err();
        assert_eq!(err.to_string(), "database is closed");
    }
}
