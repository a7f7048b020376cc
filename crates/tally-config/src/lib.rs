//! # tally-config
//!
//! Layered configuration loading for Tally using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TALLY_*` prefix, `__` as separator)
//! 2. Project-level `tally.toml` (or the file passed with `--config`)
//! 3. User-level `~/.config/tally/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TALLY_DATABASE__HOST` -> `database.host`,
//! `TALLY_BOOTSTRAP__MAX_ATTEMPTS` -> `bootstrap.max_attempts`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use tally_config::TallyConfig;
//!
//! let config = TallyConfig::load_with_dotenv(None).expect("config");
//! println!("database port: {}", config.database.port);
//! ```

mod bootstrap;
mod database;
mod error;
mod server;

pub use bootstrap::BootstrapConfig;
pub use database::{Backend, DEFAULT_NAMESPACE_FILE, DEFAULT_SERVICE_NAME, DatabaseConfig};
pub use error::ConfigError;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "tally.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TallyConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl TallyConfig {
    /// Load and validate configuration from all sources.
    ///
    /// Does NOT call `dotenvy` -- use [`TallyConfig::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the working directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load_with_dotenv(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(config_file)
    }

    /// Build the figment provider chain.
    ///
    /// An explicit `config_file` replaces the project-local `tally.toml`.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local or explicit config
        let local_path =
            config_file.map_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE), Path::to_path_buf);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("TALLY_").split("__"))
    }

    /// Reject values that would make the service misbehave at runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bootstrap.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "bootstrap.max_attempts",
                "must be at least 1",
            ));
        }
        if self.database.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "database.connect_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.database.backend == Backend::Sqlite && self.database.sqlite_path.trim().is_empty()
        {
            return Err(ConfigError::invalid(
                "database.sqlite_path",
                "required for the sqlite backend",
            ));
        }
        self.server.bind_addr()?;
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tally").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TallyConfig::default();
        config.validate().unwrap();
        assert_eq!(config.database.backend, Backend::Postgres);
        assert_eq!(config.bootstrap.max_attempts, 10);
    }

    #[test]
    fn figment_builds_without_files() {
        Jail::expect_with(|_jail| {
            let config: TallyConfig = TallyConfig::figment(None).extract()?;
            assert_eq!(config.server.bind, "0.0.0.0:5000");
            assert_eq!(config.database.port, 5432);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_project_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                PROJECT_CONFIG_FILE,
                r#"
                [database]
                host = "from-file"
                port = 6543

                [bootstrap]
                seed_titles = ["One"]
                "#,
            )?;
            jail.set_env("TALLY_DATABASE__HOST", "from-env");
            jail.set_env("TALLY_BOOTSTRAP__MAX_ATTEMPTS", "3");

            let config = TallyConfig::load(None).expect("config should load");
            assert_eq!(config.database.host, "from-env");
            assert_eq!(config.database.port, 6543);
            assert_eq!(config.bootstrap.max_attempts, 3);
            assert_eq!(config.bootstrap.seed_titles, vec!["One".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn explicit_config_file_replaces_project_file() {
        Jail::expect_with(|jail| {
            jail.create_file(PROJECT_CONFIG_FILE, "[database]\nname = \"ignored\"\n")?;
            jail.create_file("custom.toml", "[database]\nbackend = \"sqlite\"\nname = \"custom\"\n")?;

            let config = TallyConfig::load(Some(Path::new("custom.toml"))).expect("config");
            assert_eq!(config.database.name, "custom");
            assert_eq!(config.database.backend, Backend::Sqlite);
            Ok(())
        });
    }

    #[test]
    fn zero_attempts_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TALLY_BOOTSTRAP__MAX_ATTEMPTS", "0");
            let err = TallyConfig::load(None).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "bootstrap.max_attempts"),
                "unexpected error: {err}"
            );
            Ok(())
        });
    }
}
