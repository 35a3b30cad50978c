///
/// mdbe - client access layer for an embedded columnar SQL engine
///
/// Sits between host code and an engine that hands back whole result
/// columns as packed native buffers, and accepts parameters as typed bind
/// calls. The engine itself sits behind the `Engine` trait; adapters live in
/// their own crates.
///
/// Architecture:
/// - types: engine type codes, relational types, host classes and the
///   conversion matrix between them.
/// - column: decodes one fetched column cell by cell, in place.
/// - cursor: scrollable or forward-only position over a fetched result.
/// - binding: encodes host values into bind calls; prepared statements.
/// - metadata: read-only views over result and parameter types.
/// - statement / session: the thin execution surface on top.
///
/// Errors are a single `Error` enum with a stable SQLSTATE-style tag per
/// variant. Logging goes through `tracing`; the host decides where it ends
/// up.
///

pub mod binding;
pub mod column;
pub mod config;
pub mod cursor;
pub mod error;
pub mod metadata;
pub mod native;
pub mod session;
pub mod statement;
pub mod types;
pub mod value;

#[cfg(test)]
mod mock;

pub use binding::{encode, PreparedStatement};
pub use column::{decimal_scale, Column};
pub use config::{FetchMode, SessionOptions, TemporalFill};
pub use cursor::{ColumnIndex, Cursor, CursorOptions};
pub use error::{Error, ErrorKind, Result};
pub use metadata::{Nullability, ParameterMetadata, ParameterMode, ResultMetadata};
pub use native::{
    BoundValue, ColumnDescriptor, Engine, NativeError, NativeResult, Outcome, PreparedInfo,
    RawColumn, RawData, ResultHandle, StatementHandle, TypeDescriptor, UpdateCount, Unscaled,
    VarValue,
};
pub use session::Session;
pub use statement::{Execution, Statement};
pub use types::{can_convert, EngineType, HostClass, SqlType};
pub use value::{Blob, HostValue, Number, Value};
