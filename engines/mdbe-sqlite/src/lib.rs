///
/// mdbe SQLite engine
///
/// Implements the mdbe native boundary on top of rusqlite with bundled
/// SQLite, so sessions need no system database library. Column types come
/// from the declared SQL types; see `decltype` for the mapping.
///

pub mod decltype;
pub mod engine;

pub use engine::{SqliteEngine, DATABASE_FILE};

use mdbe::{Session, SessionOptions};

/// Opens a SQLite-backed session.
pub fn open_session(options: SessionOptions) -> mdbe::Result<Session> {
    let engine = SqliteEngine::open(&options)?;
    Session::open(Box::new(engine), options)
}

/// Opens a session from a `monetdb:memory:` or `monetdb:file:<dir>` URL.
pub fn connect(url: &str) -> mdbe::Result<Session> {
    open_session(SessionOptions::from_url(url)?)
}
