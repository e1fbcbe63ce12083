//! bookshelf CLI - add, read, list and delete books in a PostgreSQL table
//!
//! Each invocation opens one connection pool, runs one command and closes
//! the pool again. A failed connection is fatal; `demo` keeps going when
//! individual steps fail.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bookshelf_core::{BookStore, Deadline, MemoryBookStore, PgBookStore};
use clap::Parser;
use tracing::debug;

mod commands;
mod env;
mod tracing_setup;

use commands::Command;

/// One day
const MAX_TIMEOUT_SECS: u64 = 86_400;

#[derive(Parser, Debug)]
#[command(
    name = "bookshelf",
    author,
    version,
    about = "Add, read, list and delete books stored in PostgreSQL"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// libpq-style connection string (e.g. "host=localhost dbname=bookstore sslmode=disable")
    #[arg(long, global = true, env = "BOOKSHELF_DSN", hide_env_values = true)]
    dsn: Option<String>,

    /// Path to a TOML config file (default: ~/.bookshelf/config.toml if present)
    #[arg(long, global = true, env = "BOOKSHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds each command may wait on the database
    #[arg(
        long,
        global = true,
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    timeout: u64,

    /// Use a throwaway in-process store instead of PostgreSQL
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so BOOKSHELF_* values from .env reach clap
    env::load_dotenv();
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let timeout = Duration::from_secs(cli.timeout);

    if cli.memory {
        return run_with(MemoryBookStore::new(), cli.command, timeout).await;
    }

    let config = env::resolve(cli.dsn.as_deref(), cli.config.as_deref())?;
    debug!(connection = ?config.connection, "resolved configuration");

    let store = PgBookStore::from_config(&config)
        .await
        .context("Failed to connect to database")?;

    run_with(store, cli.command, timeout).await
}

/// Run `command` and close `store` afterwards, whatever the outcome.
async fn run_with<S: BookStore>(store: S, command: Command, timeout: Duration) -> Result<()> {
    let deadline = Deadline::after(timeout);
    let mut stdout = std::io::stdout().lock();

    let result = commands::run(&store, command, deadline, &mut stdout).await;
    let closed = store.close().await.context("Failed to close database pool");

    result.and(closed)
}
