pub mod appointments;
pub mod error;
pub mod events;
pub mod requests;
pub mod users;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/ping", get(ping))
        .merge(users::router(state.clone()))
        .merge(requests::router(state.clone()))
        .merge(appointments::router(state.clone()))
        .merge(events::router(state))
        .merge(openapi::router())
        .route_layer(middleware::from_fn(correlation_middleware));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[utoipa::path(get, path = "/api/ping", responses((status = 200, body = String)))]
pub(crate) async fn ping() -> impl IntoResponse {
    "pong"
}
