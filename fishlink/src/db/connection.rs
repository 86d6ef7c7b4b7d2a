//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies the PRAGMAs every
//! repository call relies on: WAL journaling, foreign_keys=ON, and a 5000ms busy_timeout.
//!
//! Example:
//! ```no_run
//! use fishlink::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("fishlink_example.db");
//! let _conn = connect_sqlite(&path).expect("open sqlite");
//! ```

use std::path::Path;

use anyhow::Context;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};

/// Path as the `&str` URL Diesel expects.
pub(crate) fn path_url(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("store path is not valid UTF-8: {}", path.display()))
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(path: impl AsRef<Path>) -> anyhow::Result<SqliteConnection> {
    let path = path.as_ref();
    let mut conn = SqliteConnection::establish(path_url(path)?)
        .with_context(|| format!("opening store {}", path.display()))?;

    // foreign keys and busy timeout are per-connection; WAL sticks to the file
    conn.batch_execute(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(conn)
}
