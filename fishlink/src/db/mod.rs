//! Store access: connections, embedded migrations and startup self-healing.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON,
//!   and a 5000ms busy_timeout.
//! - Embedded Diesel migrations: [`migrate::MIGRATIONS`], [`migrate::run_sqlite`] and
//!   [`migrate::run_pending`]. Diesel's migration table is the explicit schema version.
//! - [`schema_manager::ensure_latest_schema`]: the once-per-process startup check that
//!   brings a store up to date or archives it and starts fresh.
//!
//! Example:
//! ```no_run
//! use fishlink::db::{connection, schema_manager};
//!
//! let db_path = std::env::temp_dir().join("fishlink_example.db");
//! let outcome = schema_manager::ensure_latest_schema(&db_path).expect("schema");
//! println!("{outcome}");
//!
//! let _conn = connection::connect_sqlite(&db_path).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
pub mod schema_manager;
