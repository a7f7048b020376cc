//! Startup retry policy for schema initialization.
//!
//! Retries are fixed-interval: the database is expected to come up on its
//! own within a bounded window (container start, DNS propagation), so there
//! is nothing to gain from backing off.

use std::time::Duration;

use tally_config::BootstrapConfig;

/// How many initialization attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one). At least 1.
    pub max_attempts: u32,
    /// Delay after a failed attempt before the next one.
    pub retry_delay: Duration,
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(3))
    }
}

impl From<&BootstrapConfig> for RetryConfig {
    fn from(config: &BootstrapConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}
