///
/// Row cursor.
///
/// A `Cursor` owns the decoded columns of one fully fetched result and a
/// position over them:
/// - `0` is before the first row
/// - `1..=n` is on a row
/// - `n + 1` is after the last row
///
/// `n` is the native row count, clamped once at construction by
/// `CursorOptions::max_rows`. Rows past the clamp stay in the buffers but
/// are unreachable.
///
/// Column accessors take a 1-based index or a column label and require the
/// cursor to be on a row. Numeric accessors return zero for SQL NULL, the
/// others return `None`; either way `was_null()` reports it afterwards.
///
/// Moving the cursor from several threads at once is not supported; the
/// type is not `Sync`.
///

use std::cell::Cell;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::column::Column;
use crate::config::{FetchMode, TemporalFill};
use crate::error::{Error, Result};
use crate::metadata::ResultMetadata;
use crate::native::{Engine, NativeError, ResultHandle};
use crate::types::{can_convert, HostClass};
use crate::value::{Blob, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorOptions {
    /// 0 disables the clamp.
    pub max_rows: u64,
    pub fetch_mode: FetchMode,
    pub temporal_fill: TemporalFill,
}

/// Column lookup for the cursor accessors.
pub trait ColumnIndex {
    /// Resolves to a 0-based column position.
    fn resolve(&self, columns: &[Column]) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, columns: &[Column]) -> Result<usize> {
        if *self >= 1 && *self <= columns.len() {
            Ok(*self - 1)
        } else {
            Err(Error::Range {
                what: "column",
                index: *self as i64,
                count: columns.len(),
            })
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, columns: &[Column]) -> Result<usize> {
        columns
            .iter()
            .position(|c| c.name() == *self)
            .or_else(|| {
                columns
                    .iter()
                    .position(|c| c.name().eq_ignore_ascii_case(self))
            })
            .ok_or_else(|| Error::NoSuchColumn {
                label: self.to_string(),
            })
    }
}

impl ColumnIndex for String {
    fn resolve(&self, columns: &[Column]) -> Result<usize> {
        self.as_str().resolve(columns)
    }
}

pub struct Cursor<'s> {
    source: Option<(&'s dyn Engine, ResultHandle)>,
    columns: Vec<Column>,
    tuple_count: usize,
    position: usize,
    options: CursorOptions,
    was_null: Cell<bool>,
    closed: bool,
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("handle", &self.source.map(|(_, h)| h))
            .field("columns", &self.columns.len())
            .field("tuple_count", &self.tuple_count)
            .field("position", &self.position)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<'s> Cursor<'s> {
    /// Fetches every column of `result` in one transfer. The handle is
    /// released if decoding fails.
    pub fn open(
        engine: &'s dyn Engine,
        result: ResultHandle,
        rows: usize,
        columns: usize,
        options: CursorOptions,
    ) -> Result<Self> {
        let decoded = engine
            .fetch_all(result, rows, columns)
            .map_err(Error::from)
            .and_then(|raw| {
                if raw.len() != columns {
                    return Err(Error::Boundary(NativeError::new(format!(
                        "{} columns transferred, {} expected",
                        raw.len(),
                        columns
                    ))));
                }
                raw.into_iter()
                    .map(|c| Column::from_raw(c, rows))
                    .collect::<Result<Vec<_>>>()
            });
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                if let Err(release) = engine.release_result(result) {
                    warn!(handle = result.0, "releasing result after failed fetch: {}", release);
                }
                return Err(err);
            }
        };
        debug!(handle = result.0, rows, columns, "fetched result");
        let mut cursor = Self::build(decoded, rows, options);
        cursor.source = Some((engine, result));
        Ok(cursor)
    }

    /// Cursor over columns that are already decoded, with no engine handle
    /// behind it. All columns must have the same number of rows.
    pub fn detached(columns: Vec<Column>, options: CursorOptions) -> Result<Cursor<'static>> {
        let rows = columns.first().map_or(0, Column::rows);
        if let Some(bad) = columns.iter().find(|c| c.rows() != rows) {
            return Err(Error::Boundary(NativeError::new(format!(
                "column '{}' has {} rows, expected {}",
                bad.name(),
                bad.rows(),
                rows
            ))));
        }
        Ok(Cursor::build(columns, rows, options))
    }

    fn build(columns: Vec<Column>, rows: usize, options: CursorOptions) -> Self {
        let tuple_count = match usize::try_from(options.max_rows) {
            Ok(max) if max > 0 && max < rows => max,
            _ => rows,
        };
        Self {
            source: None,
            columns,
            tuple_count,
            position: 0,
            options,
            was_null: Cell::new(false),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed { what: "Cursor" })
        } else {
            Ok(())
        }
    }

    fn ensure_scrollable(&self, operation: &'static str) -> Result<()> {
        self.ensure_open()?;
        match self.options.fetch_mode {
            FetchMode::Scrollable => Ok(()),
            FetchMode::ForwardOnly => Err(Error::ForwardOnly { operation }),
        }
    }

    /// Clamps `target` into `0..=n+1` and reports whether it is on a row.
    fn place(&mut self, target: i64) -> bool {
        let n = self.tuple_count as i64;
        self.position = if target <= 0 {
            0
        } else if target > n {
            self.tuple_count + 1
        } else {
            target as usize
        };
        self.on_row()
    }

    fn on_row(&self) -> bool {
        self.position >= 1 && self.position <= self.tuple_count
    }

    /// Number of reachable rows.
    pub fn tuple_count(&self) -> usize {
        self.tuple_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.options.fetch_mode
    }

    /// Negative rows count back from the end, `-1` being the last row.
    pub fn absolute(&mut self, row: i64) -> Result<bool> {
        self.ensure_scrollable("absolute")?;
        let n = self.tuple_count as i64;
        let target = if row < 0 {
            n.saturating_add(row).saturating_add(1)
        } else {
            row
        };
        Ok(self.place(target))
    }

    pub fn relative(&mut self, rows: i64) -> Result<bool> {
        self.ensure_scrollable("relative")?;
        Ok(self.place((self.position as i64).saturating_add(rows)))
    }

    pub fn next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.place((self.position as i64).saturating_add(1)))
    }

    pub fn previous(&mut self) -> Result<bool> {
        self.ensure_scrollable("previous")?;
        Ok(self.place((self.position as i64).saturating_sub(1)))
    }

    pub fn first(&mut self) -> Result<bool> {
        self.ensure_scrollable("first")?;
        Ok(self.place(1))
    }

    pub fn last(&mut self) -> Result<bool> {
        self.ensure_scrollable("last")?;
        Ok(self.place(self.tuple_count as i64))
    }

    pub fn before_first(&mut self) -> Result<()> {
        self.ensure_scrollable("before_first")?;
        self.place(0);
        Ok(())
    }

    pub fn after_last(&mut self) -> Result<()> {
        self.ensure_scrollable("after_last")?;
        self.place(self.tuple_count as i64 + 1);
        Ok(())
    }

    pub fn is_before_first(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.position == 0)
    }

    pub fn is_after_last(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.position == self.tuple_count + 1)
    }

    pub fn is_first(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.position == 1 && self.tuple_count > 0)
    }

    pub fn is_last(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.tuple_count > 0 && self.position == self.tuple_count)
    }

    /// Current 1-based row, or 0 when not on a row.
    pub fn row(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(if self.on_row() { self.position } else { 0 })
    }

    /// Raw cursor position, `0..=tuple_count + 1`.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn find_column(&self, label: &str) -> Result<usize> {
        self.ensure_open()?;
        label.resolve(&self.columns).map(|i| i + 1)
    }

    pub fn was_null(&self) -> bool {
        self.was_null.get()
    }

    pub fn metadata(&self) -> Result<ResultMetadata> {
        self.ensure_open()?;
        Ok(ResultMetadata::from_columns(&self.columns))
    }

    /// Column and 0-based row under the cursor.
    fn locate<I: ColumnIndex>(&self, column: I) -> Result<(&Column, usize)> {
        self.ensure_open()?;
        if !self.on_row() {
            return Err(Error::InvalidPosition {
                position: self.position,
            });
        }
        let index = column.resolve(&self.columns)?;
        Ok((&self.columns[index], self.position - 1))
    }

    fn track<T>(&self, value: Option<T>) -> Option<T> {
        self.was_null.set(value.is_none());
        value
    }

    fn numeric<T: Default>(&self, value: Option<T>) -> T {
        self.track(value).unwrap_or_default()
    }

    pub fn get_bool<I: ColumnIndex>(&self, column: I) -> Result<bool> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_bool(row)?))
    }

    pub fn get_i8<I: ColumnIndex>(&self, column: I) -> Result<i8> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_i8(row)?))
    }

    pub fn get_i16<I: ColumnIndex>(&self, column: I) -> Result<i16> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_i16(row)?))
    }

    pub fn get_i32<I: ColumnIndex>(&self, column: I) -> Result<i32> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_i32(row)?))
    }

    pub fn get_i64<I: ColumnIndex>(&self, column: I) -> Result<i64> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_i64(row)?))
    }

    pub fn get_f32<I: ColumnIndex>(&self, column: I) -> Result<f32> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_f32(row)?))
    }

    pub fn get_f64<I: ColumnIndex>(&self, column: I) -> Result<f64> {
        let (col, row) = self.locate(column)?;
        Ok(self.numeric(col.get_f64(row)?))
    }

    pub fn get_i128<I: ColumnIndex>(&self, column: I) -> Result<Option<i128>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_i128(row)?))
    }

    pub fn get_decimal<I: ColumnIndex>(&self, column: I) -> Result<Option<Decimal>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_decimal(row)?))
    }

    pub fn get_string<I: ColumnIndex>(&self, column: I) -> Result<Option<String>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_string(row)?))
    }

    pub fn get_bytes<I: ColumnIndex>(&self, column: I) -> Result<Option<&[u8]>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_bytes(row)?))
    }

    pub fn get_blob<I: ColumnIndex>(&self, column: I) -> Result<Option<Blob<'_>>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_blob(row)?))
    }

    pub fn get_date<I: ColumnIndex>(&self, column: I) -> Result<Option<NaiveDate>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_date(row, self.options.temporal_fill)?))
    }

    pub fn get_time<I: ColumnIndex>(&self, column: I) -> Result<Option<NaiveTime>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_time(row, self.options.temporal_fill)?))
    }

    pub fn get_timestamp<I: ColumnIndex>(&self, column: I) -> Result<Option<NaiveDateTime>> {
        let (col, row) = self.locate(column)?;
        Ok(self.track(col.get_timestamp(row, self.options.temporal_fill)?))
    }

    /// The column's natural value.
    pub fn get_object<I: ColumnIndex>(&self, column: I) -> Result<Value> {
        let (col, row) = self.locate(column)?;
        let value = col.value(row)?;
        self.was_null.set(value.is_null());
        Ok(value)
    }

    /// The value converted to `class`, if the column's code allows it.
    pub fn get_object_as<I: ColumnIndex>(&self, column: I, class: HostClass) -> Result<Value> {
        let (col, row) = self.locate(column)?;
        if !can_convert(col.engine_type(), class) {
            return Err(Error::coercion(col.engine_type(), class.name()));
        }
        let fill = self.options.temporal_fill;
        let value = match class {
            HostClass::Bool => col.get_bool(row)?.map(Value::Bool),
            HostClass::I16 => col.get_i16(row)?.map(Value::SmallInt),
            HostClass::I32 => col.get_i32(row)?.map(Value::Int),
            HostClass::I64 => col.get_i64(row)?.map(Value::BigInt),
            HostClass::F32 => col.get_f32(row)?.map(Value::Real),
            HostClass::F64 => col.get_f64(row)?.map(Value::Double),
            HostClass::Decimal => col.get_decimal(row)?.map(Value::Decimal),
            HostClass::BigInt => col.get_i128(row)?.map(Value::HugeInt),
            HostClass::Text => col.get_string(row)?.map(Value::Text),
            HostClass::Bytes | HostClass::Blob => {
                col.get_bytes(row)?.map(|b| Value::Bytes(b.to_vec()))
            }
            HostClass::Date => col.get_date(row, fill)?.map(Value::Date),
            HostClass::Time => col.get_time(row, fill)?.map(Value::Time),
            HostClass::Timestamp => col.get_timestamp(row, fill)?.map(Value::Timestamp),
        };
        Ok(self.track(value).unwrap_or(Value::Null))
    }

    pub fn get_array<I: ColumnIndex>(&self, _column: I) -> Result<Vec<Value>> {
        self.ensure_open()?;
        Err(Error::Unsupported { feature: "get_array" })
    }

    pub fn get_row_id<I: ColumnIndex>(&self, _column: I) -> Result<i64> {
        self.ensure_open()?;
        Err(Error::Unsupported { feature: "get_row_id" })
    }

    pub fn get_character_stream<I: ColumnIndex>(&self, _column: I) -> Result<String> {
        self.ensure_open()?;
        Err(Error::Unsupported {
            feature: "get_character_stream",
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the native result handle. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some((engine, handle)) = self.source.take() {
            debug!(handle = handle.0, "releasing result");
            engine.release_result(handle)?;
        }
        Ok(())
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("closing cursor on drop: {}", err);
        }
    }
}
