//! Crate-level documentation for the fishlink library.
//!
//! Farms publish listings, a single restaurant places requests against them,
//! and each request moves along a forward-only fulfillment chain. The store is
//! SQLite via Diesel; [`db::schema_manager::ensure_latest_schema`] must run once
//! at startup before any repository call.

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod domain;
pub mod geo;
pub mod matching;
pub mod models;
pub mod repo;
#[allow(missing_docs)]
pub mod schema;
pub mod status;
pub mod tz;
