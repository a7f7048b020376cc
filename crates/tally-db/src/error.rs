//! Database error types for tally-db.
//!
//! Drivers classify their native errors into these variants. The connection
//! core only ever asks [`DatabaseError::is_connectivity`]: connectivity
//! failures drive host fallback and the startup retry loop, everything else
//! is surfaced immediately.

use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The endpoint could not be reached, timed out, or dropped the connection.
    #[error("Cannot reach database at {host}: {reason}")]
    Connectivity { host: String, reason: String },

    /// Every candidate host failed and no underlying error was recorded.
    #[error("No reachable database host (tried: {})", format_hosts(.hosts))]
    Unreachable { hosts: Vec<String> },

    /// The database rejected a write because of a constraint.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A SQL statement failed for a reason that will not resolve by waiting.
    #[error("Query failed: {0}")]
    Query(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in a row).
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DatabaseError {
    pub(crate) fn connectivity(host: &str, reason: impl ToString) -> Self {
        Self::Connectivity {
            host: host.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this failure may resolve by retrying later or on another host.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. } | Self::Unreachable { .. })
    }
}

fn format_hosts(hosts: &[String]) -> String {
    if hosts.is_empty() {
        "no candidates".to_string()
    } else {
        hosts.join(", ")
    }
}
