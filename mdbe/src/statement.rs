///
/// Plain SQL statements.
///
/// A `Statement` runs SQL text through the session's engine. Each execution
/// either yields a cursor over a fully fetched result or an update count.
/// `query_timeout` is recorded and reported but not enforced here; the
/// engine applies its own session-wide timeout.
///

use tracing::debug;

use crate::config::FetchMode;
use crate::cursor::{Cursor, CursorOptions};
use crate::error::{Error, Result};
use crate::native::{Engine, Outcome, UpdateCount};

/// What one execution produced.
#[derive(Debug)]
pub enum Execution<'s> {
    Rows(Cursor<'s>),
    Updated(UpdateCount),
}

impl<'s> Execution<'s> {
    pub(crate) fn from_outcome(
        engine: &'s dyn Engine,
        outcome: Outcome,
        options: CursorOptions,
    ) -> Result<Self> {
        match outcome {
            Outcome::Rows {
                result,
                rows,
                columns,
            } => Ok(Execution::Rows(Cursor::open(
                engine, result, rows, columns, options,
            )?)),
            Outcome::Affected(count) => Ok(Execution::Updated(count)),
        }
    }

    pub fn is_rows(&self) -> bool {
        matches!(self, Execution::Rows(_))
    }

    pub fn into_cursor(self) -> Result<Cursor<'s>> {
        match self {
            Execution::Rows(cursor) => Ok(cursor),
            Execution::Updated(_) => Err(Error::NoResultSet),
        }
    }

    /// The update count. A result set is released before the error.
    pub fn into_update_count(self) -> Result<UpdateCount> {
        match self {
            Execution::Updated(count) => Ok(count),
            Execution::Rows(mut cursor) => {
                cursor.close()?;
                Err(Error::UnexpectedResultSet)
            }
        }
    }
}

pub struct Statement<'s> {
    engine: &'s dyn Engine,
    options: CursorOptions,
    query_timeout: u64,
    batch: Vec<String>,
    closed: bool,
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("options", &self.options)
            .field("query_timeout", &self.query_timeout)
            .field("batch", &self.batch.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl<'s> Statement<'s> {
    pub(crate) fn new(engine: &'s dyn Engine, options: CursorOptions, query_timeout: u64) -> Self {
        Self {
            engine,
            options,
            query_timeout,
            batch: Vec::new(),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed { what: "Statement" })
        } else {
            Ok(())
        }
    }

    pub fn execute(&mut self, sql: &str) -> Result<Execution<'s>> {
        self.ensure_open()?;
        debug!(max_rows = self.options.max_rows, "executing: {}", sql);
        let outcome = self.engine.execute(sql, self.options.max_rows)?;
        Execution::from_outcome(self.engine, outcome, self.options)
    }

    pub fn execute_query(&mut self, sql: &str) -> Result<Cursor<'s>> {
        self.execute(sql)?.into_cursor()
    }

    pub fn execute_update(&mut self, sql: &str) -> Result<UpdateCount> {
        self.execute(sql)?.into_update_count()
    }

    pub fn max_rows(&self) -> u64 {
        self.options.max_rows
    }

    /// Caps the rows reachable through later cursors. 0 disables the cap.
    pub fn set_max_rows(&mut self, max_rows: u64) {
        self.options.max_rows = max_rows;
    }

    pub fn query_timeout(&self) -> u64 {
        self.query_timeout
    }

    pub fn set_query_timeout(&mut self, seconds: u64) {
        self.query_timeout = seconds;
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.options.fetch_mode
    }

    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.options.fetch_mode = mode;
    }

    pub fn add_batch(&mut self, sql: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.batch.push(sql.into());
        Ok(())
    }

    pub fn clear_batch(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.batch.clear();
        Ok(())
    }

    fn run_entry(&self, sql: &str) -> Result<UpdateCount> {
        match self.engine.execute(sql, 0)? {
            Outcome::Affected(count) => Ok(count),
            Outcome::Rows { result, .. } => {
                self.engine.release_result(result)?;
                Err(Error::UnexpectedResultSet)
            }
        }
    }

    /// Runs every queued statement in order. The queue is emptied whether
    /// or not it succeeds.
    pub fn execute_batch(&mut self) -> Result<Vec<UpdateCount>> {
        self.ensure_open()?;
        let batch = std::mem::take(&mut self.batch);
        let mut completed = Vec::with_capacity(batch.len());
        for (index, sql) in batch.iter().enumerate() {
            match self.run_entry(sql) {
                Ok(count) => completed.push(count),
                Err(source) => {
                    debug!(index, "batch aborted: {}", sql);
                    return Err(Error::Batch {
                        completed,
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(completed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.batch.clear();
    }
}
