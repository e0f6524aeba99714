use crate::middleware::auth::Caller;
use crate::middleware::correlation::CorrelationId;
use crate::routes::error::{invalid_id, map_error};
use crate::{AppState, build_neighborly};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use nb_core::CallContext;
use nb_core::error::RequestError;
use nb_core::types::{
    CreateRequestInput, HelpRequest, RequestId, RequestWithRequester, UpdateRequestInput,
};
use nb_events::types::EventSource;
use std::str::FromStr;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/mine", get(list_my_requests))
        .route(
            "/requests/{id}",
            get(get_request).patch(update_request).delete(delete_request),
        )
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequestInput,
    responses((status = 201, body = HelpRequest), (status = 400))
)]
pub(crate) async fn create_request(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
    Json(input): Json<CreateRequestInput>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly.requests().create(&ctx, &identity, input) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/requests",
    responses((status = 200, body = Vec<RequestWithRequester>))
)]
pub(crate) async fn list_requests(State(state): State<AppState>) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, None).into_response(),
    };
    match neighborly.requests().list() {
        Ok(requests) => Json(requests).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/requests/mine",
    responses((status = 200, body = Vec<HelpRequest>))
)]
pub(crate) async fn list_my_requests(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match neighborly.requests().list_mine(&identity) {
        Ok(requests) => Json(requests).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request ID")),
    responses((status = 200, body = RequestWithRequester), (status = 404))
)]
pub(crate) async fn get_request(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, None).into_response(),
    };
    let request_id = match RequestId::from_str(&id) {
        Ok(value) => value,
        Err(err) => return invalid_id(&err, None),
    };
    match neighborly.requests().get(&request_id) {
        Ok(Some(request)) => Json(request).into_response(),
        Ok(None) => map_error(&RequestError::NotFound.into(), None).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request ID")),
    request_body = UpdateRequestInput,
    responses((status = 200, body = HelpRequest), (status = 404))
)]
pub(crate) async fn update_request(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    // Any authenticated caller may mutate any request; ownership is not
    // enforced server-side.
    Caller(_identity): Caller,
    Path(id): Path<String>,
    Json(input): Json<UpdateRequestInput>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let request_id = match RequestId::from_str(&id) {
        Ok(value) => value,
        Err(err) => return invalid_id(&err, Some(correlation.0)),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly.requests().update(&ctx, &request_id, input) {
        Ok(request) => Json(request).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request ID")),
    responses((status = 204), (status = 409))
)]
pub(crate) async fn delete_request(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(_identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let request_id = match RequestId::from_str(&id) {
        Ok(value) => value,
        Err(err) => return invalid_id(&err, Some(correlation.0)),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly.requests().delete(&ctx, &request_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}
