//! Row-to-entity parsing helpers.
//!
//! Timestamps are selected as `CAST(created_at AS TEXT)` so both backends
//! hand back a string. PostgreSQL renders `"2026-10-19 08:30:00.123456"`,
//! SQLite's `CURRENT_TIMESTAMP` renders `"2026-10-19 08:30:00"`, and values
//! written from Rust are RFC 3339.

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Naive values are taken to be UTC.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string matches none of the formats.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}
