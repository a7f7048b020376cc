use anyhow::Context;
use tokio::net::TcpListener;

use tally_config::{ServerConfig, TallyConfig};
use tally_db::{Connector, ResolvedHost};
use tally_server::bootstrap;
use tally_server::routes::create_router;
use tally_server::state::AppState;

use crate::cli::ServeArgs;

pub async fn handle<C: Connector>(
    connector: C,
    config: &TallyConfig,
    args: &ServeArgs,
) -> anyhow::Result<()> {
    let server = ServerConfig {
        bind: args.bind.clone().unwrap_or_else(|| config.server.bind.clone()),
        ..config.server.clone()
    };
    let addr = server.bind_addr()?;

    let store = bootstrap::task_store(connector, config, ResolvedHost::new());
    let outcome = bootstrap::initialize(&store, config).await;
    if !outcome.is_ready() {
        tracing::warn!("serving without a database; requests will retry initialization");
    }

    let router = create_router(AppState::new(store), &server)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
