//! Composition root: configuration, candidate hosts, and the task store.

use std::path::Path;

use tally_config::{Backend, DatabaseConfig, TallyConfig};
use tally_db::{
    ConnectionManager, Connector, InitOutcome, ResolvedHost, RetryConfig, TaskStore,
    resolve_candidates,
};

/// Load configuration, reading `.env` from the working directory first.
///
/// # Errors
///
/// Returns an error if any source fails to parse or a value is invalid.
pub fn load_config(config_file: Option<&Path>) -> anyhow::Result<TallyConfig> {
    TallyConfig::load_with_dotenv(config_file).map_err(anyhow::Error::from)
}

/// Hosts the connection manager will try, in order.
///
/// For the SQLite backend the database file path is the only "host".
#[must_use]
pub fn candidate_hosts(database: &DatabaseConfig) -> Vec<String> {
    match database.backend {
        Backend::Postgres => resolve_candidates(database),
        Backend::Sqlite => vec![database.sqlite_path.trim().to_string()],
    }
}

/// Wire a connector into a task store sharing `resolved`.
#[must_use]
pub fn task_store<C: Connector>(
    connector: C,
    config: &TallyConfig,
    resolved: ResolvedHost,
) -> TaskStore<C> {
    let hosts = candidate_hosts(&config.database);
    tracing::info!(
        backend = ?config.database.backend,
        hosts = %hosts.join(", "),
        "database candidates resolved"
    );
    let manager = ConnectionManager::new(connector, hosts, resolved);
    TaskStore::new(manager, &config.bootstrap.seed_titles)
}

/// Run startup initialization with the configured retry policy.
pub async fn initialize<C: Connector>(store: &TaskStore<C>, config: &TallyConfig) -> InitOutcome {
    store
        .ensure_schema(RetryConfig::from(&config.bootstrap))
        .await
}
