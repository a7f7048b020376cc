//! Database connection and host discovery configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default service name used for cluster DNS discovery.
pub const DEFAULT_SERVICE_NAME: &str = "postgres";

/// Namespace file mounted into every pod by the service-account admission controller.
pub const DEFAULT_NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

const fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "tasks".into()
}

fn default_user() -> String {
    "postgres".into()
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.into()
}

fn default_fallback_namespace() -> String {
    "default".into()
}

fn default_cluster_suffix() -> String {
    "svc.cluster.local".into()
}

fn default_namespace_file() -> PathBuf {
    PathBuf::from(DEFAULT_NAMESPACE_FILE)
}

fn default_sqlite_path() -> String {
    "tasks.db".into()
}

/// Which storage driver backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Network PostgreSQL reached through host discovery.
    #[default]
    Postgres,
    /// Local libSQL/SQLite file.
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Explicit host override. When non-empty, discovery is skipped entirely.
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Upper bound on a single connection attempt, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Cluster service name of the database (e.g. `postgres`).
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Explicit namespace hint. Tried before the namespace file.
    #[serde(default)]
    pub namespace: String,

    /// Namespace tried after the configured one and the namespace file.
    #[serde(default = "default_fallback_namespace")]
    pub fallback_namespace: String,

    /// Cluster DNS suffix (e.g. `svc.cluster.local`).
    #[serde(default = "default_cluster_suffix")]
    pub cluster_suffix: String,

    /// Runtime-provided file holding the current namespace. Missing is fine.
    #[serde(default = "default_namespace_file")]
    pub namespace_file: PathBuf,

    /// Database file for the `sqlite` backend.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            host: String::new(),
            port: default_port(),
            name: default_name(),
            user: default_user(),
            password: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            service_name: default_service_name(),
            namespace: String::new(),
            fallback_namespace: default_fallback_namespace(),
            cluster_suffix: default_cluster_suffix(),
            namespace_file: default_namespace_file(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl DatabaseConfig {
    /// The trimmed explicit host override, if one is set.
    pub fn host_override(&self) -> Option<&str> {
        let host = self.host.trim();
        (!host.is_empty()).then_some(host)
    }

    /// Service name used for discovery, falling back to [`DEFAULT_SERVICE_NAME`].
    pub fn discovery_service(&self) -> &str {
        let service = self.service_name.trim();
        if service.is_empty() {
            DEFAULT_SERVICE_NAME
        } else {
            service
        }
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = DatabaseConfig::default();
        assert_eq!(config.backend, Backend::Postgres);
        assert_eq!(config.port, 5432);
        assert_eq!(config.name, "tasks");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.fallback_namespace, "default");
        assert_eq!(config.cluster_suffix, "svc.cluster.local");
        assert!(config.host_override().is_none());
    }

    #[test]
    fn host_override_ignores_whitespace() {
        let mut config = DatabaseConfig {
            host: "   ".into(),
            ..Default::default()
        };
        assert!(config.host_override().is_none());

        config.host = " db.internal ".into();
        assert_eq!(config.host_override(), Some("db.internal"));
    }

    #[test]
    fn blank_service_name_falls_back_to_default() {
        let config = DatabaseConfig {
            service_name: " ".into(),
            ..Default::default()
        };
        assert_eq!(config.discovery_service(), DEFAULT_SERVICE_NAME);
    }
}
