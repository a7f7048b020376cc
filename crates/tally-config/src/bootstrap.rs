//! Startup schema initialization settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_max_attempts() -> u32 {
    10
}

const fn default_retry_delay_secs() -> u64 {
    3
}

fn default_seed_titles() -> Vec<String> {
    vec!["Containerize backend".into(), "Deploy to Minikube".into()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
    /// Attempts at creating the schema before starting degraded.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Titles inserted when the task table is empty at startup.
    #[serde(default = "default_seed_titles")]
    pub seed_titles: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            seed_titles: default_seed_titles(),
        }
    }
}

impl BootstrapConfig {
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = BootstrapConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.retry_delay(), Duration::from_secs(3));
        assert_eq!(
            config.seed_titles,
            vec!["Containerize backend", "Deploy to Minikube"]
        );
    }
}
