use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nb_core::error::{AppointmentError, NeighborlyError, RequestError, UserError};
use nb_core::types::IdError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &NeighborlyError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        NeighborlyError::User(user) => map_user_error(user),
        NeighborlyError::Request(request) => map_request_error(request),
        NeighborlyError::Appointment(appointment) => map_appointment_error(appointment),
        NeighborlyError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message.clone(),
        ),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

/// Path ids that fail to parse never reach the service layer.
pub fn invalid_id(err: &IdError, correlation_id: Option<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorEnvelope {
            code: "invalid_input",
            message: err.to_string(),
            correlation_id,
        }),
    )
        .into_response()
}

fn map_user_error(err: &UserError) -> (StatusCode, &'static str, String) {
    match err {
        UserError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        UserError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
        UserError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

fn map_request_error(err: &RequestError) -> (StatusCode, &'static str, String) {
    match err {
        RequestError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        RequestError::HasAppointments => (StatusCode::CONFLICT, "conflict", err.to_string()),
        RequestError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
        RequestError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

fn map_appointment_error(err: &AppointmentError) -> (StatusCode, &'static str, String) {
    match err {
        AppointmentError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        AppointmentError::AlreadyBooked => (StatusCode::CONFLICT, "conflict", err.to_string()),
        AppointmentError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
        AppointmentError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}
