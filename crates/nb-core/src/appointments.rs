use crate::error::AppointmentError;
use crate::types::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentId, AppointmentStatus,
    CreateAppointmentInput, RequestId, UserId, VolunteerAppointment,
};

pub trait AppointmentRepository {
    fn create(
        &self,
        volunteer_id: &UserId,
        input: CreateAppointmentInput,
    ) -> Result<Appointment, AppointmentError>;
    fn get(&self, id: &AppointmentId) -> Result<Option<Appointment>, AppointmentError>;
    fn get_detail(&self, id: &AppointmentId)
    -> Result<Option<AppointmentDetail>, AppointmentError>;
    fn list(&self, filter: AppointmentFilter) -> Result<Vec<AppointmentDetail>, AppointmentError>;
    fn list_by_volunteer(
        &self,
        volunteer_id: &UserId,
    ) -> Result<Vec<VolunteerAppointment>, AppointmentError>;
    /// Appointments for a request whose status still counts as active,
    /// i.e. anything other than CANCELLED.
    fn list_active_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Appointment>, AppointmentError>;
    /// Count of all appointments for a request, cancelled ones included.
    /// Drives the delete-protection check.
    fn count_for_request(&self, request_id: &RequestId) -> Result<u64, AppointmentError>;
    fn set_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError>;
    /// Force every appointment of the request to COMPLETED and return the
    /// updated rows. Used by the request-completion cascade.
    fn complete_all_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Appointment>, AppointmentError>;
    fn delete(&self, id: &AppointmentId) -> Result<(), AppointmentError>;
}
