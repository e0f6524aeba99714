use crate::types::{
    Appointment, AppointmentId, AppointmentStatus, HelpRequest, RequestId, User,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Typed payload of a persisted event. Serialized into the event log as
/// `{"type": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    UserRegistered {
        user: User,
    },
    UserUpdated {
        user: User,
    },

    RequestCreated {
        request: HelpRequest,
    },
    RequestUpdated {
        request: HelpRequest,
    },
    /// Explicit completion; carries the appointments that were
    /// force-completed along with it.
    RequestCompleted {
        request: HelpRequest,
        appointments: Vec<Appointment>,
    },
    RequestReopened {
        request: HelpRequest,
    },
    RequestDeleted {
        request_id: RequestId,
    },

    AppointmentBooked {
        appointment: Appointment,
        request: HelpRequest,
    },
    AppointmentUpdated {
        appointment: Appointment,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    AppointmentCancelled {
        appointment: Appointment,
    },
    AppointmentDeleted {
        appointment_id: AppointmentId,
    },
}
