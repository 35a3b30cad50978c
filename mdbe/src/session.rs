///
/// Sessions.
///
/// A `Session` owns one engine connection. Statements, prepared statements
/// and cursors borrow the session, so it cannot be closed while any of them
/// is alive.
///

use tracing::{debug, info, warn};

use crate::binding::PreparedStatement;
use crate::config::SessionOptions;
use crate::error::{Error, Result};
use crate::native::{Engine, UpdateCount};
use crate::statement::Statement;

pub struct Session {
    engine: Box<dyn Engine>,
    options: SessionOptions,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Session {
    /// Wraps an opened engine and applies the session's commit mode.
    pub fn open(engine: Box<dyn Engine>, options: SessionOptions) -> Result<Self> {
        if engine.autocommit()? != options.autocommit {
            engine.set_autocommit(options.autocommit)?;
        }
        info!(
            location = %options
                .directory
                .as_ref()
                .map_or_else(|| ":memory:".to_string(), |d| d.display().to_string()),
            autocommit = options.autocommit,
            "session opened"
        );
        Ok(Self {
            engine,
            options,
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed { what: "Session" })
        } else {
            Ok(())
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn create_statement(&self) -> Result<Statement<'_>> {
        self.ensure_open()?;
        Ok(Statement::new(
            self.engine.as_ref(),
            self.options.cursor_options(),
            self.options.query_timeout,
        ))
    }

    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement<'_>> {
        self.ensure_open()?;
        debug!("preparing: {}", sql);
        let info = self.engine.prepare(sql)?;
        Ok(PreparedStatement::new(
            self.engine.as_ref(),
            info,
            self.options.cursor_options(),
        ))
    }

    pub fn autocommit(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.engine.autocommit()?)
    }

    pub fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        self.ensure_open()?;
        self.engine.set_autocommit(enabled)?;
        self.options.autocommit = enabled;
        Ok(())
    }

    fn end_transaction(&self, operation: &'static str, sql: &str) -> Result<UpdateCount> {
        self.ensure_open()?;
        if self.engine.autocommit()? {
            return Err(Error::AutocommitMode { operation });
        }
        self.create_statement()?.execute_update(sql)
    }

    pub fn commit(&self) -> Result<()> {
        self.end_transaction("commit", "COMMIT")?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.end_transaction("rollback", "ROLLBACK")?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.engine.close()?;
        debug!("session closed");
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("closing session on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::{int_raw_column, MockEngine};

    #[test]
    fn test_open_applies_commit_mode() {
        let engine = MockEngine::new();
        let mut options = SessionOptions::in_memory();
        options.autocommit = false;
        let session = Session::open(Box::new(engine.clone()), options).unwrap();
        assert!(!session.autocommit().unwrap());
        assert!(!engine.autocommit().unwrap());
    }

    #[test]
    fn test_commit_requires_manual_mode() {
        let engine = MockEngine::new();
        let mut session =
            Session::open(Box::new(engine.clone()), SessionOptions::default()).unwrap();
        let err = session.commit().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.to_string(), "Cannot commit while in autocommit mode");

        session.set_autocommit(false).unwrap();
        session.commit().unwrap();
        session.rollback().unwrap();
        assert_eq!(engine.executed(), vec!["COMMIT", "ROLLBACK"]);
    }

    #[test]
    fn test_statements_inherit_session_options() {
        let engine = MockEngine::new();
        engine.queue_rows(vec![int_raw_column("n", &[1, 2, 3])], 3);
        let mut options = SessionOptions::in_memory();
        options.max_rows = 1;
        options.query_timeout = 9;
        let session = Session::open(Box::new(engine.clone()), options).unwrap();
        let mut stmt = session.create_statement().unwrap();
        assert_eq!(stmt.query_timeout(), 9);
        let cursor = stmt.execute_query("SELECT n FROM t").unwrap();
        assert_eq!(cursor.tuple_count(), 1);
    }

    #[test]
    fn test_close_closes_engine_once() {
        let engine = MockEngine::new();
        let session = Session::open(Box::new(engine.clone()), SessionOptions::default()).unwrap();
        {
            let mut stmt = session.prepare("SELECT 1").unwrap();
            stmt.execute_update().unwrap();
        }
        assert_eq!(engine.released_statements(), 1);
        session.close().unwrap();
        assert!(engine.is_closed());
    }
}
