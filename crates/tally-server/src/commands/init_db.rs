use tally_config::TallyConfig;
use tally_db::{Connector, InitOutcome, ResolvedHost};

use tally_server::bootstrap;

pub async fn handle<C: Connector>(connector: C, config: &TallyConfig) -> anyhow::Result<()> {
    let store = bootstrap::task_store(connector, config, ResolvedHost::new());
    match bootstrap::initialize(&store, config).await {
        InitOutcome::Succeeded { seeded, .. } => {
            println!("database ready ({seeded} rows seeded)");
            Ok(())
        }
        InitOutcome::Aborted { error, .. } => {
            Err(anyhow::Error::new(error).context("database initialization aborted"))
        }
        InitOutcome::Exhausted {
            attempts,
            hosts,
            last_error,
        } => Err(anyhow::Error::new(last_error).context(format!(
            "database unreachable after {attempts} attempts (tried: {})",
            hosts.join(", ")
        ))),
    }
}
