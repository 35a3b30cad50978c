///
/// mdbe shell - command line client for mdbe sessions
///
/// Opens a SQLite-backed session and runs SQL against it:
/// - mdbe-shell query <sql>: run statements and print results
/// - mdbe-shell run <file>: run a SQL script
/// - mdbe-shell describe <sql>: print the columns a query returns
/// - mdbe-shell config: print the effective session configuration
///
/// The session comes from `--url` (default `monetdb:memory:`) or a TOML
/// file given with `--config`. Logs go to stderr, or to the session's
/// `log_file`, filtered by RUST_LOG.
///

mod render;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use mdbe::{Execution, Session, SessionOptions};

#[derive(Parser)]
#[command(name = "mdbe-shell")]
#[command(author, version, about = "Command line shell for mdbe sessions", long_about = None)]
struct Cli {
    /// Session URL, e.g. monetdb:memory: or monetdb:file:/path/to/db
    #[arg(long, default_value = "monetdb:memory:")]
    url: String,

    /// Session configuration file (TOML); overrides --url
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum rows reachable per result (0 for no limit)
    #[arg(long)]
    max_rows: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more `;`-separated statements
    Query {
        /// SQL text
        sql: String,
    },

    /// Run a SQL script file
    Run {
        /// The script to run
        file: PathBuf,
    },

    /// Describe the columns a query returns
    Describe {
        /// SQL text of the query
        sql: String,
    },

    /// Print the effective session configuration as TOML
    Config,
}

fn load_options(cli: &Cli) -> mdbe::Result<SessionOptions> {
    let mut options = match &cli.config {
        Some(path) => SessionOptions::load(path)?,
        None => SessionOptions::from_url(&cli.url)?,
    };
    if let Some(max_rows) = cli.max_rows {
        options.max_rows = max_rows;
    }
    Ok(options)
}

fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });
    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .init(),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    error!("{}", message);
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(options.log_file.as_deref());

    match &cli.command {
        Commands::Config => match options.to_toml_string() {
            Ok(text) => print!("{}", text),
            Err(e) => fail(e),
        },
        Commands::Query { sql } => run_script(options, sql),
        Commands::Run { file } => {
            let script = match std::fs::read_to_string(file) {
                Ok(s) => s,
                Err(e) => fail(format!("cannot read {}: {}", file.display(), e)),
            };
            run_script(options, &script);
        }
        Commands::Describe { sql } => describe_query(options, sql),
    }
}

fn open(options: SessionOptions) -> Session {
    match mdbe_sqlite::open_session(options) {
        Ok(session) => session,
        Err(e) => fail(e),
    }
}

fn run_script(options: SessionOptions, script: &str) {
    let session = open(options);
    if let Err(e) = execute_all(&session, script) {
        fail(e);
    }
    if let Err(e) = session.close() {
        fail(e);
    }
}

fn execute_all(session: &Session, script: &str) -> mdbe::Result<()> {
    let mut stmt = session.create_statement()?;
    for sql in render::split_statements(script) {
        debug!("running: {}", sql);
        match stmt.execute(&sql)? {
            Execution::Rows(mut cursor) => println!("{}", render::table(&mut cursor)?),
            Execution::Updated(count) => println!("{}", render::update(count)),
        }
    }
    Ok(())
}

fn describe_query(options: SessionOptions, sql: &str) {
    let session = open(options);
    let described = session
        .prepare(sql)
        .and_then(|stmt| stmt.result_metadata())
        .and_then(|meta| render::describe(&meta));
    match described {
        Ok(text) => println!("{}", text),
        Err(e) => fail(e),
    }
}
