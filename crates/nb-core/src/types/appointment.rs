use crate::types::enums::AppointmentStatus;
use crate::types::ids::{AppointmentId, RequestId, UserId};
use crate::types::request::{HelpRequest, RequestWithRequester};
use crate::types::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A volunteer's commitment to fulfil one request at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: AppointmentId,
    pub request_id: RequestId,
    pub volunteer_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detail view: the appointment with its request and volunteer joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub request: HelpRequest,
    pub volunteer: User,
}

/// A volunteer's own booking, with the request and the request's owner
/// joined in so the volunteer can see who they are helping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VolunteerAppointment {
    pub appointment: Appointment,
    pub request: RequestWithRequester,
}
