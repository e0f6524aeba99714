use utoipa::OpenApi;

use crate::routes::events::EventsQuery;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use nb_core::types::appointment::{Appointment, AppointmentDetail, VolunteerAppointment};
use nb_core::types::enums::{AppointmentStatus, RequestStatus};
use nb_core::types::ids::{AppointmentId, RequestId, UserId};
use nb_core::types::io::{
    AppointmentFilter, CreateAppointmentInput, CreateRequestInput, UpdateAppointmentInput,
    UpdateRequestInput, UpdateUserInput,
};
use nb_core::types::request::{HelpRequest, RequestWithRequester};
use nb_core::types::user::{Identity, User};
use nb_events::types::{EventRecord, EventSource};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::ping,
        crate::routes::users::verify_user,
        crate::routes::users::get_me,
        crate::routes::users::update_me,
        crate::routes::requests::create_request,
        crate::routes::requests::list_requests,
        crate::routes::requests::list_my_requests,
        crate::routes::requests::get_request,
        crate::routes::requests::update_request,
        crate::routes::requests::delete_request,
        crate::routes::appointments::book_appointment,
        crate::routes::appointments::list_appointments,
        crate::routes::appointments::list_my_appointments,
        crate::routes::appointments::get_appointment,
        crate::routes::appointments::update_appointment,
        crate::routes::appointments::delete_appointment,
        crate::routes::events::list_events,
        crate::routes::events::stream
    ),
    components(schemas(
        User,
        Identity,
        HelpRequest,
        RequestWithRequester,
        Appointment,
        AppointmentDetail,
        VolunteerAppointment,
        CreateRequestInput,
        UpdateRequestInput,
        CreateAppointmentInput,
        UpdateAppointmentInput,
        UpdateUserInput,
        AppointmentFilter,
        EventsQuery,
        UserId,
        RequestId,
        AppointmentId,
        RequestStatus,
        AppointmentStatus,
        EventRecord,
        EventSource
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn ensure_initialized() {
    let _ = ApiDoc::openapi();
}

pub fn router() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(docs))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn docs() -> impl IntoResponse {
    let html = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Neighborly API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({ url: '/api/openapi.json', dom_id: '#swagger-ui' });
    </script>
  </body>
</html>
"#;
    axum::response::Html(html)
}
