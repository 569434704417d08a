//! # SQLite backend
//!
//! [`SqliteDatabase`] implements every backend trait in [`crate::traits`] on top of a `sqlx` SQLite pool.
//!
//! The submodules contain the "low-level" queries. They are simple functions (rather than stateful structs) that
//! accept a `&mut SqliteConnection` argument. Callers obtain a connection from the pool, or open an atomic
//! transaction as the need arises and pass it through to the functions without any other changes.
//!
//! Every write runs inside an explicit transaction that is committed before the call returns, including single
//! `INSERT … RETURNING` statements. Transactions that read before they write are opened with [`begin_write`].
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    Sqlite,
    SqlitePool,
    Transaction,
};

pub mod cards;
pub mod item_lists;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;

const SQLITE_DB_URL: &str = "sqlite://data/bookswap.db";
/// How long a writer waits for the write lock before giving up with `database is locked`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("BSW_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ BSW_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool. The database file is created if it does not exist yet, and foreign key enforcement is
/// switched on for every connection.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Opens a transaction that holds the write lock from its first statement.
///
/// A plain `BEGIN` is deferred. A deferred transaction that reads first asks for the write lock only at its first
/// write, and in WAL mode SQLite refuses that upgrade at once (`SQLITE_BUSY`) if another connection has committed in
/// the meantime. Writing first makes concurrent writers queue on the busy timeout instead. The statement below
/// matches no rows, but still takes the lock.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, SqlxError> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE tiers SET id = id WHERE 0").execute(&mut *tx).await?;
    Ok(tx)
}

/// `true` if the error is a unique constraint violation, e.g. a second insert of the same cart line.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_unique_violation())
}
