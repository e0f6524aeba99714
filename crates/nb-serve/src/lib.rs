pub mod middleware;
pub mod openapi;
pub mod routes;

use crate::middleware::auth::AuthVerifier;
use axum::Router;
use nb_core::{Neighborly, NeighborlyError};
use nb_db::schema;
use nb_db::store::DbStore;
use nb_events::bus::EventBus;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub db_path: String,
    pub event_bus: EventBus,
    pub auth: Arc<AuthVerifier>,
}

/// One service instance per request. SQLite opens are cheap and the pool
/// of one keeps the connection out of shared mutable state.
pub fn build_neighborly(state: &AppState) -> Result<Neighborly<DbStore>, NeighborlyError> {
    let conn =
        schema::open_and_migrate(&state.db_path).map_err(|err| NeighborlyError::Internal {
            message: err.to_string(),
        })?;
    let store = DbStore::new(conn);
    Ok(Neighborly::new(store, state.event_bus.clone()))
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state)).await
}
