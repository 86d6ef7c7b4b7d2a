//! Embedded, ordered schema migrations.
//!
//! Each migration under `migrations/` is idempotent (`IF NOT EXISTS` or
//! drop-then-create DDL), so it can be replayed against a store that already
//! has the shape. Diesel records
//! applied versions in `__diesel_schema_migrations`, which serves as the
//! store's explicit schema version.

use std::path::Path;

use anyhow::anyhow;
use diesel::{
    Connection, QueryableByName, RunQueryDsl, SqliteConnection, connection::SimpleConnection,
    sql_query, sql_types::Integer,
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::db::connection::path_url;

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const VERSION_TABLE: &str = "__diesel_schema_migrations";

#[derive(QueryableByName)]
struct TableCount {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}

/// Whether the store carries Diesel's migration table.
pub fn is_versioned(conn: &mut SqliteConnection) -> anyhow::Result<bool> {
    let row: TableCount = sql_query(
        "SELECT COUNT(*) AS cnt FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind::<diesel::sql_types::Text, _>(VERSION_TABLE)
    .get_result(conn)?;
    Ok(row.cnt > 0)
}

/// Apply every pending migration in order; returns the versions applied.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<Vec<String>> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

/// Versions recorded in the store, oldest first.
pub fn applied_versions(conn: &mut SqliteConnection) -> anyhow::Result<Vec<String>> {
    let mut versions: Vec<String> = conn
        .applied_migrations()
        .map_err(|e| anyhow!(e))?
        .iter()
        .map(ToString::to_string)
        .collect();
    versions.sort();
    Ok(versions)
}

/// Runs pending migrations on the SQLite store at `path`, creating it if needed.
///
/// This sets the journal mode to WAL and applies all embedded migrations.
pub fn run_sqlite(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let mut conn = SqliteConnection::establish(path_url(path.as_ref())?)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    run_pending(&mut conn)
}
