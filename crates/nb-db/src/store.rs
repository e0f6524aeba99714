use nb_core::error::NeighborlyError;
use nb_core::store::Store;
use rusqlite::Connection;

use crate::appointment_repo::AppointmentRepo;
use crate::event_repo::EventRepo;
use crate::request_repo::RequestRepo;
use crate::user_repo::UserRepo;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for DbStore {
    type Users<'a>
        = UserRepo<'a>
    where
        Self: 'a;
    type Requests<'a>
        = RequestRepo<'a>
    where
        Self: 'a;
    type Appointments<'a>
        = AppointmentRepo<'a>
    where
        Self: 'a;
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;

    fn users(&self) -> Self::Users<'_> {
        UserRepo::new(&self.conn)
    }

    fn requests(&self) -> Self::Requests<'_> {
        RequestRepo::new(&self.conn)
    }

    fn appointments(&self) -> Self::Appointments<'_> {
        AppointmentRepo::new(&self.conn)
    }

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, NeighborlyError>
    where
        F: FnOnce(&Self) -> Result<T, NeighborlyError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(internal)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(internal)?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").map_err(internal)?;
                Err(err)
            }
        }
    }
}

fn internal(err: rusqlite::Error) -> NeighborlyError {
    NeighborlyError::Internal {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use nb_core::error::{AppointmentError, RequestError, UserError};
    use nb_core::types::{
        AppointmentFilter, AppointmentStatus, CreateAppointmentInput, CreateRequestInput,
        HelpRequest, Identity, RequestStatus, UpdateAppointmentInput, UpdateRequestInput,
        UpdateUserInput, User,
    };
    use nb_core::{CallContext, Neighborly};
    use nb_events::bus::EventBus;
    use nb_events::types::EventSource;

    fn service() -> Neighborly<DbStore> {
        let conn = schema::with_test_db().unwrap();
        Neighborly::new(DbStore::new(conn), EventBus::new(16))
    }

    fn ctx() -> CallContext {
        CallContext::new(EventSource::Api, Some("corr-test".to_string()))
    }

    fn identity(subject: &str) -> Identity {
        Identity {
            subject: subject.to_string(),
            name: Some(format!("{subject} name")),
            email: Some(format!("{subject}@example.com")),
        }
    }

    fn verified(nb: &Neighborly<DbStore>, subject: &str) -> (Identity, User) {
        let identity = identity(subject);
        let user = nb.users().verify(&ctx(), &identity).unwrap();
        (identity, user)
    }

    fn open_request(nb: &Neighborly<DbStore>, requester: &Identity) -> HelpRequest {
        nb.requests()
            .create(
                &ctx(),
                requester,
                CreateRequestInput {
                    title: "Fix fence".to_string(),
                    description: "Broken fence panel".to_string(),
                },
            )
            .unwrap()
    }

    fn request_status(nb: &Neighborly<DbStore>, request: &HelpRequest) -> RequestStatus {
        nb.requests()
            .get(&request.id)
            .unwrap()
            .unwrap()
            .request
            .status
    }

    #[test]
    fn verify_is_idempotent() {
        let nb = service();
        let identity = identity("auth0|alice");
        let first = nb.users().verify(&ctx(), &identity).unwrap();
        let second = nb.users().verify(&ctx(), &identity).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.subject, "auth0|alice");
    }

    #[test]
    fn update_profile_changes_name_and_email() {
        let nb = service();
        let (identity, _) = verified(&nb, "auth0|alice");
        let updated = nb
            .users()
            .update_profile(
                &ctx(),
                &identity.subject,
                UpdateUserInput {
                    name: Some("Alice A.".to_string()),
                    email: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Alice A.");
        assert_eq!(updated.email, "auth0|alice@example.com");
    }

    #[test]
    fn update_profile_for_unknown_subject_is_not_found() {
        let nb = service();
        let err = nb
            .users()
            .update_profile(
                &ctx(),
                "auth0|ghost",
                UpdateUserInput {
                    name: Some("Ghost".to_string()),
                    email: None,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            NeighborlyError::User(UserError::NotFound)
        ));
    }

    #[test]
    fn create_request_starts_open_and_round_trips() {
        let nb = service();
        let (identity, user) = verified(&nb, "auth0|alice");
        let request = open_request(&nb, &identity);
        assert_eq!(request.status, RequestStatus::Open);

        let fetched = nb.requests().get(&request.id).unwrap().unwrap();
        assert_eq!(fetched.request.title, "Fix fence");
        assert_eq!(fetched.request.description, "Broken fence panel");
        assert_eq!(fetched.request.requester_id, user.id);
        assert_eq!(fetched.requester.id, user.id);
    }

    #[test]
    fn blank_title_is_rejected() {
        let nb = service();
        let (identity, _) = verified(&nb, "auth0|alice");
        let err = nb
            .requests()
            .create(
                &ctx(),
                &identity,
                CreateRequestInput {
                    title: "  ".to_string(),
                    description: "Broken fence panel".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            NeighborlyError::Request(RequestError::InvalidInput { .. })
        ));
    }

    #[test]
    fn blank_description_is_rejected() {
        let nb = service();
        let (identity, _) = verified(&nb, "auth0|alice");
        let err = nb
            .requests()
            .create(
                &ctx(),
                &identity,
                CreateRequestInput {
                    title: "Fix fence".to_string(),
                    description: String::new(),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            NeighborlyError::Request(RequestError::InvalidInput { .. })
        ));
    }

    #[test]
    fn booking_marks_request_in_progress() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, volunteer_user) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);

        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.volunteer_id, volunteer_user.id);
        assert_eq!(request_status(&nb, &request), RequestStatus::InProgress);

        let detail = nb.appointments().get(&appointment.id).unwrap().unwrap();
        assert_eq!(detail.appointment.id, appointment.id);
        assert_eq!(detail.request.id, request.id);
        assert_eq!(detail.volunteer.id, volunteer_user.id);
    }

    #[test]
    fn second_active_booking_conflicts() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let (other, _) = verified(&nb, "auth0|carol");
        let request = open_request(&nb, &requester);

        nb.appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        let err = nb
            .appointments()
            .book(
                &ctx(),
                &other,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            NeighborlyError::Appointment(AppointmentError::AlreadyBooked)
        ));
    }

    #[test]
    fn cancelling_last_active_appointment_reopens_request() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);
        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        let cancelled = nb
            .appointments()
            .set_status(
                &ctx(),
                &appointment.id,
                UpdateAppointmentInput {
                    status: AppointmentStatus::Cancelled,
                },
            )
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(request_status(&nb, &request), RequestStatus::Open);
    }

    #[test]
    fn rebooking_after_cancel_succeeds() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);
        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();
        nb.appointments()
            .set_status(
                &ctx(),
                &appointment.id,
                UpdateAppointmentInput {
                    status: AppointmentStatus::Cancelled,
                },
            )
            .unwrap();

        let again = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();
        assert_eq!(again.status, AppointmentStatus::Scheduled);
        assert_eq!(request_status(&nb, &request), RequestStatus::InProgress);
    }

    #[test]
    fn completing_request_completes_its_appointments() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);
        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        let updated = nb
            .requests()
            .update(
                &ctx(),
                &request.id,
                UpdateRequestInput {
                    title: None,
                    description: None,
                    status: Some(RequestStatus::Completed),
                },
            )
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Completed);

        let detail = nb.appointments().get(&appointment.id).unwrap().unwrap();
        assert_eq!(detail.appointment.status, AppointmentStatus::Completed);
    }

    #[test]
    fn cancel_does_not_reopen_completed_request() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);
        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();
        nb.requests()
            .update(
                &ctx(),
                &request.id,
                UpdateRequestInput {
                    title: None,
                    description: None,
                    status: Some(RequestStatus::Completed),
                },
            )
            .unwrap();

        nb.appointments()
            .set_status(
                &ctx(),
                &appointment.id,
                UpdateAppointmentInput {
                    status: AppointmentStatus::Cancelled,
                },
            )
            .unwrap();
        assert_eq!(request_status(&nb, &request), RequestStatus::Completed);
    }

    #[test]
    fn deleting_request_with_appointments_conflicts() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);
        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        // Even a cancelled appointment keeps the request undeletable.
        nb.appointments()
            .set_status(
                &ctx(),
                &appointment.id,
                UpdateAppointmentInput {
                    status: AppointmentStatus::Cancelled,
                },
            )
            .unwrap();
        let err = nb.requests().delete(&ctx(), &request.id).unwrap_err();
        assert!(matches!(
            err,
            NeighborlyError::Request(RequestError::HasAppointments)
        ));
    }

    #[test]
    fn deleting_request_without_appointments_succeeds() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let request = open_request(&nb, &requester);
        nb.requests().delete(&ctx(), &request.id).unwrap();
        assert!(nb.requests().get(&request.id).unwrap().is_none());
    }

    #[test]
    fn deleting_last_appointment_reopens_request() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let request = open_request(&nb, &requester);
        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        nb.appointments().delete(&ctx(), &appointment.id).unwrap();
        assert!(nb.appointments().get(&appointment.id).unwrap().is_none());
        assert_eq!(request_status(&nb, &request), RequestStatus::Open);
    }

    #[test]
    fn updating_missing_appointment_is_not_found() {
        let nb = service();
        let err = nb
            .appointments()
            .set_status(
                &ctx(),
                &nb_core::types::AppointmentId::generate(),
                UpdateAppointmentInput {
                    status: AppointmentStatus::Completed,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            NeighborlyError::Appointment(AppointmentError::NotFound)
        ));
    }

    #[test]
    fn listing_filters_by_request() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");
        let first = open_request(&nb, &requester);
        let second = open_request(&nb, &requester);
        nb.appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: first.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();
        nb.appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: second.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();

        let all = nb
            .appointments()
            .list(AppointmentFilter { request_id: None })
            .unwrap();
        assert_eq!(all.len(), 2);

        let filtered = nb
            .appointments()
            .list(AppointmentFilter {
                request_id: Some(first.id.clone()),
            })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].request.id, first.id);

        let mine = nb.appointments().list_mine(&volunteer).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].request.requester.subject, "auth0|alice");
    }

    #[test]
    fn events_are_appended_in_sequence() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let request = open_request(&nb, &requester);
        nb.requests()
            .update(
                &ctx(),
                &request.id,
                UpdateRequestInput {
                    title: Some("Fix the fence".to_string()),
                    description: None,
                    status: None,
                },
            )
            .unwrap();

        let events = nb.events().list(None, None).unwrap();
        assert!(events.len() >= 3);
        for pair in events.windows(2) {
            assert!(pair[0].seq < pair[1].seq);
        }
        assert_eq!(events[0].correlation_id.as_deref(), Some("corr-test"));

        let tail = nb.events().list(Some(events[0].seq), None).unwrap();
        assert_eq!(tail.len(), events.len() - 1);
    }

    #[test]
    fn fence_scenario() {
        let nb = service();
        let (requester, _) = verified(&nb, "auth0|alice");
        let (volunteer, _) = verified(&nb, "auth0|bob");

        let request = open_request(&nb, &requester);
        assert_eq!(request.status, RequestStatus::Open);

        let appointment = nb
            .appointments()
            .book(
                &ctx(),
                &volunteer,
                CreateAppointmentInput {
                    request_id: request.id.clone(),
                    scheduled_at: chrono::Utc::now(),
                },
            )
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(request_status(&nb, &request), RequestStatus::InProgress);

        nb.appointments()
            .set_status(
                &ctx(),
                &appointment.id,
                UpdateAppointmentInput {
                    status: AppointmentStatus::Cancelled,
                },
            )
            .unwrap();
        assert_eq!(request_status(&nb, &request), RequestStatus::Open);
    }
}
