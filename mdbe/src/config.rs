///
/// # Session Configuration
///
/// `SessionOptions` collects everything a session is opened with. It can be
/// read from TOML or from a connection URL; both forms share the same keys.
///
/// ## Example session.toml
///
/// ```toml
/// directory = "/var/lib/mdbe/sales"
/// autocommit = false
/// query_timeout = 30
/// memory_limit = 512
/// nr_threads = 4
/// max_rows = 1000
/// fetch_mode = "forward_only"
/// temporal_fill = "reject"
/// ```
///
/// ## URL form
///
/// ```text
/// monetdb:memory:
/// monetdb:file:/var/lib/mdbe/sales?autocommit=false&max_rows=1000
/// ```
///
/// Timeouts are in seconds and `memory_limit` is in MiB; 0 leaves the
/// engine default in place.
///

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cursor::CursorOptions;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Scrollable,
    ForwardOnly,
}

impl FromStr for FetchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scrollable" => Ok(FetchMode::Scrollable),
            "forward_only" => Ok(FetchMode::ForwardOnly),
            _ => Err(Error::Config(format!("unknown fetch_mode '{}'", s))),
        }
    }
}

/// What to fill in when a temporal value is projected onto a type with
/// parts the source does not have (a timestamp read from a date column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalFill {
    /// Missing time of day is 00:00:00, missing date is 1970-01-01.
    #[default]
    Midnight,
    /// Such projections are coercion errors.
    Reject,
}

impl TemporalFill {
    /// Builds the projected value with `make`, or refuses under `Reject`.
    pub fn apply<T>(self, to: &'static str, make: impl FnOnce() -> T) -> Result<T> {
        match self {
            TemporalFill::Midnight => Ok(make()),
            TemporalFill::Reject => Err(Error::Coercion {
                from: "partial temporal value (temporal_fill = reject)".to_string(),
                to,
            }),
        }
    }
}

impl FromStr for TemporalFill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "midnight" => Ok(TemporalFill::Midnight),
            "reject" => Ok(TemporalFill::Reject),
            _ => Err(Error::Config(format!("unknown temporal_fill '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOptions {
    /// Database directory. `None` opens an in-memory database.
    pub directory: Option<PathBuf>,
    pub autocommit: bool,
    pub session_timeout: u64,
    pub query_timeout: u64,
    pub memory_limit: u64,
    pub nr_threads: u32,
    pub log_file: Option<PathBuf>,
    pub max_rows: u64,
    pub fetch_mode: FetchMode,
    pub temporal_fill: TemporalFill,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            directory: None,
            autocommit: true,
            session_timeout: 0,
            query_timeout: 0,
            memory_limit: 0,
            nr_threads: 0,
            log_file: None,
            max_rows: 0,
            fetch_mode: FetchMode::default(),
            temporal_fill: TemporalFill::default(),
        }
    }
}

impl SessionOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Parses `[monetdb:]memory:` or `[monetdb:]file:<dir>`, each with an
    /// optional `?key=value&...` query.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url.strip_prefix("monetdb:").unwrap_or(url);
        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let mut options = if location == "memory:" || location == "memory" {
            Self::in_memory()
        } else if let Some(dir) = location.strip_prefix("file:") {
            if dir.is_empty() {
                return Err(Error::Config(format!("missing directory in '{}'", url)));
            }
            Self::in_directory(dir)
        } else {
            return Err(Error::Config(format!("unsupported URL '{}'", url)));
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("expected key=value, got '{}'", pair)))?;
            options.set(key, value)?;
        }
        Ok(options)
    }

    /// Sets one option from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "autocommit" => self.autocommit = parse_value(key, value)?,
            "session_timeout" => self.session_timeout = parse_value(key, value)?,
            "query_timeout" => self.query_timeout = parse_value(key, value)?,
            "memory_limit" => self.memory_limit = parse_value(key, value)?,
            "nr_threads" => self.nr_threads = parse_value(key, value)?,
            "max_rows" => self.max_rows = parse_value(key, value)?,
            "log_file" => self.log_file = Some(PathBuf::from(value)),
            "fetch_mode" => self.fetch_mode = value.parse()?,
            "temporal_fill" => self.temporal_fill = value.parse()?,
            _ => return Err(Error::Config(format!("unknown option '{}'", key))),
        }
        Ok(())
    }

    pub fn cursor_options(&self) -> CursorOptions {
        CursorOptions {
            max_rows: self.max_rows,
            fetch_mode: self.fetch_mode,
            temporal_fill: self.temporal_fill,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value '{}' for {}", value, key)))
}
