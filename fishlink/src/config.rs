//! Runtime configuration: TOML file plus environment overrides.
//!
//! ```toml
//! database_path = "fishlink.db"
//! display_timezone = "Asia/Phnom_Penh"
//! ```
//!
//! Both keys are optional; unknown keys are rejected so typos surface early.
//!
//! Resolution order used by [`FishlinkConfig::from_env`]:
//! 1. the file named by [`CONFIG_ENV_VAR`], when set (otherwise defaults);
//! 2. [`DB_PATH_ENV_VAR`] overrides `database_path`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "FISHLINK_CONFIG";
/// Environment variable overriding the store location.
pub const DB_PATH_ENV_VAR: &str = "FISHLINK_DB_PATH";

const DEFAULT_DB_PATH: &str = "fishlink.db";
const DEFAULT_TIMEZONE: &str = "Asia/Phnom_Penh";

/// An environment variable required by the caller is not set.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FishlinkConfig {
    /// SQLite store location.
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
    /// IANA zone used when rendering store timestamps.
    #[serde(default = "default_timezone")]
    pub display_timezone: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for FishlinkConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            display_timezone: default_timezone(),
        }
    }
}

impl FishlinkConfig {
    /// Load from the environment (see module docs).
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = match get_env_var(CONFIG_ENV_VAR) {
            Ok(path) => load_config_path(&path)?,
            Err(_) => Self::default(),
        };
        if let Ok(db_path) = get_env_var(DB_PATH_ENV_VAR) {
            cfg.database_path = PathBuf::from(db_path);
        }
        Ok(cfg)
    }

    /// Parsed display zone.
    pub fn display_tz(&self) -> anyhow::Result<Tz> {
        crate::tz::parse_tz(&self.display_timezone)
    }
}

/// Parse a TOML string and validate the time zone.
pub fn load_config_str(s: &str) -> anyhow::Result<FishlinkConfig> {
    let cfg: FishlinkConfig = toml::from_str(s).context("invalid fishlink config")?;
    cfg.display_tz()?;
    Ok(cfg)
}

/// Read and parse a TOML config file.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<FishlinkConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    load_config_str(&s).with_context(|| format!("loading config {}", path.display()))
}
