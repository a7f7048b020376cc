use tally_config::{Backend, TallyConfig};
use tally_db::{PostgresConnector, SqliteConnector};

use crate::cli::Commands;
use crate::commands::{hosts, init_db, serve};

/// Route a parsed command to its handler, choosing the storage driver once.
pub async fn dispatch(command: Commands, config: &TallyConfig) -> anyhow::Result<()> {
    match command {
        Commands::Hosts => hosts::handle(config),
        Commands::InitDb => match config.database.backend {
            Backend::Postgres => {
                init_db::handle(PostgresConnector::from_config(&config.database), config).await
            }
            Backend::Sqlite => {
                init_db::handle(SqliteConnector::from_config(&config.database), config).await
            }
        },
        Commands::Serve(args) => match config.database.backend {
            Backend::Postgres => {
                serve::handle(PostgresConnector::from_config(&config.database), config, &args)
                    .await
            }
            Backend::Sqlite => {
                serve::handle(SqliteConnector::from_config(&config.database), config, &args)
                    .await
            }
        },
    }
}
