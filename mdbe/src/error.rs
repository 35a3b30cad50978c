///
/// Error types.
///
/// One enum for every failure the access layer reports. Callers branch on
/// `Error::kind()` for the failure class and read `Error::sql_state()` for a
/// stable five character reason tag; the `Display` text is for humans.
///

use thiserror::Error;

use crate::native::{NativeError, UpdateCount};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Boundary,
    Range,
    Coercion,
    State,
    Unsupported,
    Batch,
    Config,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Engine error: {0}")]
    Boundary(#[from] NativeError),

    #[error("{what} index {index} out of range ({count} available)")]
    Range {
        what: &'static str,
        index: i64,
        count: usize,
    },

    #[error("No such column name: '{label}'")]
    NoSuchColumn { label: String },

    #[error("Conversion not allowed from {from} to {to}")]
    Coercion { from: String, to: &'static str },

    #[error("Cannot parse '{text}' as {target}")]
    Parse { text: String, target: &'static str },

    #[error("{what} is closed")]
    Closed { what: &'static str },

    #[error("Cursor is not positioned on a row (position {position})")]
    InvalidPosition { position: usize },

    #[error("Operation '{operation}' is not allowed on a forward-only cursor")]
    ForwardOnly { operation: &'static str },

    #[error("Parameter {index} has not been bound")]
    Unbound { index: usize },

    #[error("Query did not produce a result set")]
    NoResultSet,

    #[error("Query produced a result set")]
    UnexpectedResultSet,

    #[error("Cannot {operation} while in autocommit mode")]
    AutocommitMode { operation: &'static str },

    #[error("Feature not supported: {feature}")]
    Unsupported { feature: &'static str },

    #[error(
        "Batch aborted at entry {index} after {} successful statements: {source}",
        .completed.len()
    )]
    Batch {
        completed: Vec<UpdateCount>,
        index: usize,
        source: Box<Error>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Boundary(_) => ErrorKind::Boundary,
            Error::Range { .. } | Error::NoSuchColumn { .. } => ErrorKind::Range,
            Error::Coercion { .. } | Error::Parse { .. } => ErrorKind::Coercion,
            Error::Closed { .. }
            | Error::InvalidPosition { .. }
            | Error::ForwardOnly { .. }
            | Error::Unbound { .. }
            | Error::NoResultSet
            | Error::UnexpectedResultSet
            | Error::AutocommitMode { .. } => ErrorKind::State,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Batch { .. } => ErrorKind::Batch,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub fn sql_state(&self) -> &'static str {
        match self {
            Error::Boundary(_) => "HY000",
            Error::Range { .. } => "M1M05",
            Error::NoSuchColumn { .. } => "42S22",
            Error::Coercion { .. } | Error::Parse { .. } => "22018",
            Error::Closed { .. }
            | Error::InvalidPosition { .. }
            | Error::ForwardOnly { .. } => "M1M20",
            Error::Unbound { .. } => "07001",
            Error::NoResultSet => "M1M19",
            Error::UnexpectedResultSet => "M1M17",
            Error::AutocommitMode { .. } => "2D000",
            Error::Unsupported { .. } => "0A000",
            Error::Batch { source, .. } => source.sql_state(),
            Error::Config(_) => "22023",
        }
    }

    /// Update counts of the batch entries that ran before a batch failed.
    /// Empty for every other error.
    pub fn completed_updates(&self) -> &[UpdateCount] {
        match self {
            Error::Batch { completed, .. } => completed,
            _ => &[],
        }
    }

    pub(crate) fn coercion(from: impl ToString, to: &'static str) -> Self {
        Error::Coercion {
            from: from.to_string(),
            to,
        }
    }

    pub(crate) fn parse(text: &str, target: &'static str) -> Self {
        Error::Parse {
            text: text.to_string(),
            target,
        }
    }
}
