//! Startup self-healing for the store.
//!
//! On every process start [`ensure_latest_schema`] guarantees the store at the
//! configured path exposes the current entity shapes:
//!
//! 1. No store (or a zero-byte file): create it from the embedded migrations.
//! 2. Versioned store: apply pending migrations, then verify every required
//!    column is present.
//! 3. Unversioned store (an original-deployment file): verify columns first;
//!    if they all match, adopt it by replaying the idempotent migrations.
//! 4. Anything else is stale: the file (plus `-wal`/`-shm` sidecars) is renamed
//!    to `<path>.bak-<YYYYmmdd-HHMMSS>` and a fresh, empty store is created.
//!
//! Old rows are never transformed and never deleted. The archive is left for
//! manual recovery and its path is logged at WARN. This trades data carry-over
//! for simplicity, which suits a low-volume pilot.
//!
//! The check-and-migrate sequence is guarded per store path so it runs at most
//! once per process; later calls return the first outcome.

use std::{
    collections::{HashMap, HashSet},
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use anyhow::Context;
use chrono::Utc;
use diesel::{
    Connection, QueryResult, QueryableByName, RunQueryDsl, SqliteConnection, sql_query,
    sql_types::Text,
};
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::db::{connection::path_url, migrate};

/// Every column the current shape requires, per table.
pub const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "farms",
        &["id", "name", "location_text", "lat", "lng", "maps_url", "contact"],
    ),
    (
        "restaurants",
        &["id", "name", "location_text", "lat", "lng", "maps_url", "contact"],
    ),
    (
        "listings",
        &[
            "id",
            "farm_id",
            "fish_name",
            "quantity_kg",
            "price_per_kg",
            "slot_today_morning",
            "slot_today_evening",
            "slot_next_morning",
            "slot_next_evening",
            "allow_delivery",
            "allow_pickup",
            "allow_live",
            "allow_fresh",
            "approx_time",
        ],
    ),
    (
        "requests",
        &[
            "id",
            "listing_id",
            "restaurant_id",
            "status",
            "quantity_kg",
            "preferred_size_text",
            "fish_condition",
            "time_slot",
            "delivery_method",
            "preferred_time_window",
            "notes",
            "distance_km",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "reviews",
        &["id", "request_id", "farm_id", "restaurant_id", "stars", "comment"],
    ),
];

/// Why an existing store could not be brought up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// `table.column` entries absent from the store.
    MissingColumns(Vec<String>),
    /// A pending migration failed (and was rolled back).
    MigrationFailed(String),
    /// The file could not be read as a SQLite database.
    Unreadable(String),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::MissingColumns(cols) => write!(f, "missing columns: {}", cols.join(", ")),
            StaleReason::MigrationFailed(e) => write!(f, "migration failed: {e}"),
            StaleReason::Unreadable(e) => write!(f, "unreadable store: {e}"),
        }
    }
}

/// What the startup check did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// No store existed; a fresh one was created.
    Created,
    /// The store was current. `applied` lists migrations run just now (often empty).
    UpToDate {
        /// Migration versions applied during this check.
        applied: Vec<String>,
    },
    /// The store was stale; it now lives at `backup` and a fresh store replaced it.
    Archived {
        /// Where the old file was moved.
        backup: PathBuf,
        /// What made it stale.
        reason: StaleReason,
    },
}

impl fmt::Display for SchemaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaOutcome::Created => f.write_str("created new store"),
            SchemaOutcome::UpToDate { applied } if applied.is_empty() => {
                f.write_str("store is up to date")
            }
            SchemaOutcome::UpToDate { applied } => {
                write!(f, "store migrated ({})", applied.join(", "))
            }
            SchemaOutcome::Archived { backup, reason } => write!(
                f,
                "stale store archived to {} ({reason}); created new store",
                backup.display()
            ),
        }
    }
}

#[derive(QueryableByName)]
struct ColumnName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// `table.column` entries of [`REQUIRED_COLUMNS`] absent from the store.
pub fn missing_columns(conn: &mut SqliteConnection) -> QueryResult<Vec<String>> {
    let mut missing = Vec::new();
    for (table, required) in REQUIRED_COLUMNS {
        let present: HashSet<String> = sql_query("SELECT name FROM pragma_table_info(?)")
            .bind::<Text, _>(*table)
            .load::<ColumnName>(conn)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        missing.extend(
            required
                .iter()
                .filter(|col| !present.contains(**col))
                .map(|col| format!("{table}.{col}")),
        );
    }
    Ok(missing)
}

/// Unguarded check-and-migrate for one store path.
pub struct SchemaManager {
    path: PathBuf,
}

impl SchemaManager {
    /// Manager for the store file at `path`. Nothing is touched until [`run`](Self::run).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file this manager checks.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the startup sequence once (see module docs).
    pub fn run(&self) -> anyhow::Result<SchemaOutcome> {
        let path = self.path.as_path();

        if !store_exists(path)? {
            migrate::run_sqlite(path)
                .with_context(|| format!("creating store {}", path.display()))?;
            info!(path = %path.display(), "created new store");
            return Ok(SchemaOutcome::Created);
        }

        match bring_current(path)? {
            Ok(applied) => {
                if applied.is_empty() {
                    debug!(path = %path.display(), "store is up to date");
                } else {
                    info!(path = %path.display(), ?applied, "applied store migrations");
                }
                Ok(SchemaOutcome::UpToDate { applied })
            }
            Err(reason) => {
                let backup = archive_store(path)?;
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    %reason,
                    "stale store archived"
                );
                migrate::run_sqlite(path)
                    .with_context(|| format!("recreating store {}", path.display()))?;
                Ok(SchemaOutcome::Archived { backup, reason })
            }
        }
    }
}

static ENSURED: Lazy<Mutex<HashMap<PathBuf, SchemaOutcome>>> = Lazy::new(Default::default);

/// Process-guarded startup check for `path`.
///
/// The first call per path runs [`SchemaManager::run`]; concurrent callers wait,
/// and every later call returns the recorded outcome without touching the store.
pub fn ensure_latest_schema(path: impl AsRef<Path>) -> anyhow::Result<SchemaOutcome> {
    let path = path.as_ref().to_path_buf();
    let mut ensured = ENSURED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(outcome) = ensured.get(&path) {
        return Ok(outcome.clone());
    }
    let outcome = SchemaManager::new(path.clone()).run()?;
    ensured.insert(path, outcome.clone());
    Ok(outcome)
}

// A zero-byte file (e.g. a freshly created temp file) counts as absent.
fn store_exists(path: &Path) -> anyhow::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() > 0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("inspecting store {}", path.display())),
    }
}

// Outer error: cannot even address the path. Inner error: the store is stale.
// The connection is dropped before returning so the file can be renamed.
fn bring_current(path: &Path) -> anyhow::Result<Result<Vec<String>, StaleReason>> {
    let url = path_url(path)?;
    let unreadable = |e: diesel::result::Error| StaleReason::Unreadable(e.to_string());

    let mut conn = match SqliteConnection::establish(url) {
        Ok(conn) => conn,
        Err(e) => return Ok(Err(StaleReason::Unreadable(e.to_string()))),
    };

    let versioned = match migrate::is_versioned(&mut conn) {
        Ok(v) => v,
        Err(e) => return Ok(Err(StaleReason::Unreadable(format!("{e:#}")))),
    };

    if !versioned {
        let missing = match missing_columns(&mut conn) {
            Ok(missing) => missing,
            Err(e) => return Ok(Err(unreadable(e))),
        };
        if !missing.is_empty() {
            return Ok(Err(StaleReason::MissingColumns(missing)));
        }
    }

    let applied = match migrate::run_pending(&mut conn) {
        Ok(applied) => applied,
        Err(e) => return Ok(Err(StaleReason::MigrationFailed(format!("{e:#}")))),
    };

    match missing_columns(&mut conn) {
        Ok(missing) if missing.is_empty() => Ok(Ok(applied)),
        Ok(missing) => Ok(Err(StaleReason::MissingColumns(missing))),
        Err(e) => Ok(Err(unreadable(e))),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// `<path>.bak-<stamp>`, or `<path>.bak-<stamp>-<n>` if that name is taken.
fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let base = with_suffix(path, &format!(".bak-{stamp}"));
    if !base.exists() {
        return base;
    }
    (1..)
        .map(|n| with_suffix(&base, &format!("-{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

fn archive_store(path: &Path) -> anyhow::Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let backup = backup_path(path, &stamp);
    fs::rename(path, &backup)
        .with_context(|| format!("archiving {} to {}", path.display(), backup.display()))?;

    for sidecar in ["-wal", "-shm"] {
        let from = with_suffix(path, sidecar);
        if from.exists() {
            let to = with_suffix(&backup, sidecar);
            fs::rename(&from, &to)
                .with_context(|| format!("archiving {}", from.display()))?;
        }
    }
    Ok(backup)
}
