use crate::middleware::auth::Caller;
use crate::middleware::correlation::CorrelationId;
use crate::routes::error::{invalid_id, map_error};
use crate::{AppState, build_neighborly};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use nb_core::CallContext;
use nb_core::error::AppointmentError;
use nb_core::types::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentId, CreateAppointmentInput,
    UpdateAppointmentInput, VolunteerAppointment,
};
use nb_events::types::EventSource;
use std::str::FromStr;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/appointments", post(book_appointment).get(list_appointments))
        .route("/appointments/mine", get(list_my_appointments))
        .route(
            "/appointments/{id}",
            get(get_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = CreateAppointmentInput,
    responses((status = 201, body = Appointment), (status = 409))
)]
pub(crate) async fn book_appointment(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
    Json(input): Json<CreateAppointmentInput>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly.appointments().book(&ctx, &identity, input) {
        Ok(appointment) => (StatusCode::CREATED, Json(appointment)).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/appointments",
    params(AppointmentFilter),
    responses((status = 200, body = Vec<AppointmentDetail>))
)]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    Query(filter): Query<AppointmentFilter>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, None).into_response(),
    };
    match neighborly.appointments().list(filter) {
        Ok(appointments) => Json(appointments).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/appointments/mine",
    responses((status = 200, body = Vec<VolunteerAppointment>))
)]
pub(crate) async fn list_my_appointments(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(identity): Caller,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match neighborly.appointments().list_mine(&identity) {
        Ok(appointments) => Json(appointments).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = String, Path, description = "Appointment ID")),
    responses((status = 200, body = AppointmentDetail), (status = 404))
)]
pub(crate) async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, None).into_response(),
    };
    let appointment_id = match AppointmentId::from_str(&id) {
        Ok(value) => value,
        Err(err) => return invalid_id(&err, None),
    };
    match neighborly.appointments().get(&appointment_id) {
        Ok(Some(appointment)) => Json(appointment).into_response(),
        Ok(None) => map_error(&AppointmentError::NotFound.into(), None).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/appointments/{id}",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentInput,
    responses((status = 200, body = Appointment), (status = 404))
)]
pub(crate) async fn update_appointment(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    // Any authenticated caller may mutate any appointment; ownership is
    // not enforced server-side.
    Caller(_identity): Caller,
    Path(id): Path<String>,
    Json(input): Json<UpdateAppointmentInput>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let appointment_id = match AppointmentId::from_str(&id) {
        Ok(value) => value,
        Err(err) => return invalid_id(&err, Some(correlation.0)),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly
        .appointments()
        .set_status(&ctx, &appointment_id, input)
    {
        Ok(appointment) => Json(appointment).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    params(("id" = String, Path, description = "Appointment ID")),
    responses((status = 204), (status = 404))
)]
pub(crate) async fn delete_appointment(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Caller(_identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let neighborly = match build_neighborly(&state) {
        Ok(neighborly) => neighborly,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let appointment_id = match AppointmentId::from_str(&id) {
        Ok(value) => value,
        Err(err) => return invalid_id(&err, Some(correlation.0)),
    };
    let ctx = CallContext::new(EventSource::Api, Some(correlation.0));
    match neighborly.appointments().delete(&ctx, &appointment_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}
