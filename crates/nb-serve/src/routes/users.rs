use crate::middleware::auth::Caller;
use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::{AppState, build_neighborly};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use nb_core::CallContext;
use nb_core::types::{UpdateUserInput, User};
use nb_events::types::EventSource;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/verify", post(verify_user))
        .route("/users/me", get(get_me).patch(update_me))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/users/verify",
    responses((status = 200, body = User), (status = 401))
)]
pub(crate) async fn verify_user(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly.users().verify(&ctx, &identity) {
        Ok(user) => Json(user).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses((status = 200, body = User), (status = 404))
)]
pub(crate) async fn get_me(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match neighborly.users().get_by_subject(&identity.subject) {
        Ok(user) => Json(user).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateUserInput,
    responses((status = 200, body = User), (status = 404))
)]
pub(crate) async fn update_me(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
    Json(input): Json<UpdateUserInput>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly
        .users()
        .update_profile(&ctx, &identity.subject, input)
    {
        Ok(user) => Json(user).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}
