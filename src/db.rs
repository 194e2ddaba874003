use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use time::{macros::format_description, OffsetDateTime, UtcOffset};
use tracing::info;

/// Open a pool against `database_url` with foreign keys enforced.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(database_url)
        .context("parse DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !database_url.contains(":memory:") {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let db = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("connect to database")?;
    info!(database_url, "database connected");
    Ok(db)
}

/// A private in-memory database. Each SQLite connection to `:memory:` is its
/// own database, so the pool holds exactly one connection and never recycles it.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("connect to in-memory database")?;
    Ok(db)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Fixed-width UTC text matching the store's default timestamp, so that text
/// order and time order agree.
pub fn format_timestamp(ts: OffsetDateTime) -> anyhow::Result<String> {
    let fmt = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    ts.to_offset(UtcOffset::UTC)
        .format(&fmt)
        .context("format timestamp")
}

/// Which user column a unique-constraint failure refers to, if any.
pub fn unique_violation_field(err: &sqlx::Error) -> Option<&'static str> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    let message = db_err.message();
    if message.contains("users.username") {
        Some("username")
    } else if message.contains("users.email") {
        Some("email")
    } else {
        None
    }
}

pub fn is_check_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_check_violation())
        .unwrap_or(false)
}
