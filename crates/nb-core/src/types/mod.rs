pub mod appointment;
pub mod enums;
pub mod event;
pub mod ids;
pub mod io;
pub mod request;
pub mod user;

pub use appointment::{Appointment, AppointmentDetail, VolunteerAppointment};
pub use enums::{AppointmentStatus, RequestStatus};
pub use event::EventBody;
pub use ids::{AppointmentId, IdError, RequestId, UserId};
pub use io::{
    AppointmentFilter, CreateAppointmentInput, CreateRequestInput, UpdateAppointmentInput,
    UpdateRequestInput, UpdateUserInput,
};
pub use request::{HelpRequest, RequestWithRequester};
pub use user::{Identity, User};
