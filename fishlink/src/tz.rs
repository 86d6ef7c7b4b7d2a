//! Store timestamp parsing and local-time rendering.
//!
//! The store assigns `created_at` / `updated_at` as RFC-3339 UTC strings with
//! millisecond precision. Stores adopted from the original deployment carry
//! SQLite's `CURRENT_TIMESTAMP` form (`2024-03-10 09:30:00`, implicitly UTC);
//! both are accepted here.
//!
//! All comparisons and ordering happen on the stored UTC text. Local time is
//! only produced at the display edge via [`to_local_display`].
//!
//! Example:
//! - `"2024-03-10T02:30:00.000Z"` in `Asia/Phnom_Penh` ->
//!   `"2024-03-10 09:30:00 (UTC+07:00)"`

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a store timestamp (RFC-3339 with offset, or the legacy UTC form) to UTC.
pub fn parse_store_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, LEGACY_FORMAT)
        .with_context(|| format!("bad store timestamp: {s}"))?;
    Ok(naive.and_utc())
}

/// Parse an IANA zone name such as `"Asia/Phnom_Penh"`.
pub fn parse_tz(name: &str) -> anyhow::Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow!("unknown time zone {name:?}: {e}"))
}

/// Render a store timestamp in `tz`; unparseable input is returned unchanged.
pub fn to_local_display(stored: &str, tz: Tz) -> String {
    match parse_store_ts(stored) {
        Ok(utc) => utc
            .with_timezone(&tz)
            .format("%Y-%m-%d %H:%M:%S (UTC%:z)")
            .to_string(),
        Err(_) => stored.to_string(),
    }
}
