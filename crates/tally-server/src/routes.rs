//! Router assembly.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tally_config::ServerConfig;
use tally_db::Connector;

use crate::handlers;
use crate::state::AppState;

/// Build the full router: JSON API, HTML page, and health probes.
///
/// # Errors
///
/// Returns an error if `cors_allow_origin` is not a valid header value.
pub fn create_router<C: Connector>(
    state: AppState<C>,
    server: &ServerConfig,
) -> anyhow::Result<Router> {
    let api = Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks::<C>).post(handlers::tasks::create_task::<C>),
        )
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task::<C>)
                .put(handlers::tasks::update_task::<C>)
                .patch(handlers::tasks::update_task::<C>)
                .delete(handlers::tasks::delete_task::<C>),
        )
        .route(
            "/tasks/{id}/complete",
            post(handlers::tasks::toggle_task::<C>),
        );

    let router = Router::new()
        .nest("/api", api)
        .route("/", get(handlers::pages::index::<C>))
        .route("/tasks", post(handlers::pages::add_task::<C>))
        .route(
            "/tasks/{id}/complete",
            post(handlers::pages::complete_task::<C>),
        )
        .route("/health/live", get(handlers::health::live))
        .route("/health/ready", get(handlers::health::ready::<C>))
        .layer(cors_layer(server)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn cors_layer(server: &ServerConfig) -> anyhow::Result<CorsLayer> {
    let origin = if server.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let value = HeaderValue::from_str(server.cors_allow_origin.trim()).map_err(|error| {
            anyhow::anyhow!(
                "invalid server.cors_allow_origin '{}': {error}",
                server.cors_allow_origin
            )
        })?;
        AllowOrigin::exact(value)
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}
