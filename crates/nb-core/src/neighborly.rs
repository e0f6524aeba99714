use crate::appointments::AppointmentRepository;
use crate::error::{AppointmentError, NeighborlyError, RequestError, UserError};
use crate::events::EventRepository;
use crate::requests::RequestRepository;
use crate::store::Store;
use crate::users::UserRepository;
use crate::types::event::EventBody;
use crate::types::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentId, AppointmentStatus,
    CreateAppointmentInput, CreateRequestInput, HelpRequest, Identity, RequestId, RequestStatus,
    RequestWithRequester, UpdateAppointmentInput, UpdateRequestInput, UpdateUserInput, User,
    VolunteerAppointment,
};
use crate::validation::validate_request_fields;
use chrono::Utc;
use nb_events::bus::EventBus;
use nb_events::types::{EventRecord, EventSource};

/// Ambient context of one externally triggered operation: where it came
/// from and the correlation id threaded through logs and events.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl CallContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

/// Service layer. Owns every business rule; the store only does CRUD.
pub struct Neighborly<S: Store> {
    store: S,
    event_bus: EventBus,
}

impl<S: Store> Neighborly<S> {
    pub fn new(store: S, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    pub fn users(&self) -> UsersApi<'_, S> {
        UsersApi { core: self }
    }

    pub fn requests(&self) -> RequestsApi<'_, S> {
        RequestsApi { core: self }
    }

    pub fn appointments(&self) -> AppointmentsApi<'_, S> {
        AppointmentsApi { core: self }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a mutation inside one transaction, append the events it produced
    /// to the log, and publish them on the bus once the commit succeeded.
    fn with_events<T, F>(&self, ctx: &CallContext, f: F) -> Result<T, NeighborlyError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<EventBody>), NeighborlyError>,
    {
        let (value, records) = self.store.with_tx(|store| {
            let (value, bodies) = f(store)?;
            let mut records = Vec::new();
            for body in bodies {
                let record = build_event_record(ctx, body)?;
                let record = store.events().append(record)?;
                records.push(record);
            }
            Ok((value, records))
        })?;
        for record in records {
            let _ = self.event_bus.publish(record);
        }
        Ok(value)
    }
}

pub struct UsersApi<'a, S: Store> {
    core: &'a Neighborly<S>,
}

impl<'a, S: Store> UsersApi<'a, S> {
    /// Idempotent get-or-create keyed on the external subject id. The
    /// lookup and insert run in one transaction so concurrent first logins
    /// from the same subject cannot race each other.
    pub fn verify(&self, ctx: &CallContext, identity: &Identity) -> Result<User, NeighborlyError> {
        self.core.with_events(ctx, |store| {
            if let Some(user) = store.users().find_by_subject(&identity.subject)? {
                return Ok((user, Vec::new()));
            }
            let user = store.users().create(identity)?;
            Ok((user.clone(), vec![EventBody::UserRegistered { user }]))
        })
    }

    pub fn get_by_subject(&self, subject: &str) -> Result<User, NeighborlyError> {
        self.core
            .store
            .users()
            .find_by_subject(subject)?
            .ok_or_else(|| UserError::NotFound.into())
    }

    pub fn update_profile(
        &self,
        ctx: &CallContext,
        subject: &str,
        input: UpdateUserInput,
    ) -> Result<User, NeighborlyError> {
        self.core.with_events(ctx, |store| {
            let user = store
                .users()
                .find_by_subject(subject)?
                .ok_or(UserError::NotFound)?;
            let updated = store.users().update(&user.id, input)?;
            Ok((
                updated.clone(),
                vec![EventBody::UserUpdated { user: updated }],
            ))
        })
    }
}

pub struct RequestsApi<'a, S: Store> {
    core: &'a Neighborly<S>,
}

impl<'a, S: Store> RequestsApi<'a, S> {
    pub fn create(
        &self,
        ctx: &CallContext,
        identity: &Identity,
        input: CreateRequestInput,
    ) -> Result<HelpRequest, NeighborlyError> {
        validate_request_fields(&input.title, &input.description)?;
        self.core.with_events(ctx, |store| {
            let requester = store
                .users()
                .find_by_subject(&identity.subject)?
                .ok_or(UserError::NotFound)?;
            let request = store.requests().create(&requester.id, input)?;
            Ok((
                request.clone(),
                vec![EventBody::RequestCreated { request }],
            ))
        })
    }

    pub fn get(&self, id: &RequestId) -> Result<Option<RequestWithRequester>, NeighborlyError> {
        self.core
            .store
            .requests()
            .get_with_requester(id)
            .map_err(NeighborlyError::from)
    }

    pub fn list(&self) -> Result<Vec<RequestWithRequester>, NeighborlyError> {
        self.core
            .store
            .requests()
            .list()
            .map_err(NeighborlyError::from)
    }

    pub fn list_mine(&self, identity: &Identity) -> Result<Vec<HelpRequest>, NeighborlyError> {
        let requester = self
            .core
            .store
            .users()
            .find_by_subject(&identity.subject)?
            .ok_or(UserError::NotFound)?;
        self.core
            .store
            .requests()
            .list_by_requester(&requester.id)
            .map_err(NeighborlyError::from)
    }

    /// Apply field changes. Setting the status to COMPLETED additionally
    /// force-completes every appointment of the request, in the same
    /// transaction, so the two writes commit or roll back together.
    pub fn update(
        &self,
        ctx: &CallContext,
        id: &RequestId,
        input: UpdateRequestInput,
    ) -> Result<HelpRequest, NeighborlyError> {
        let completing = input.status == Some(RequestStatus::Completed);
        self.core.with_events(ctx, |store| {
            let updated = store.requests().update(id, input)?;
            if completing {
                let appointments = store.appointments().complete_all_for_request(id)?;
                return Ok((
                    updated.clone(),
                    vec![EventBody::RequestCompleted {
                        request: updated,
                        appointments,
                    }],
                ));
            }
            Ok((
                updated.clone(),
                vec![EventBody::RequestUpdated { request: updated }],
            ))
        })
    }

    /// A request with any appointment on record, cancelled ones included,
    /// cannot be deleted.
    pub fn delete(&self, ctx: &CallContext, id: &RequestId) -> Result<(), NeighborlyError> {
        self.core.with_events(ctx, |store| {
            let request = store.requests().get(id)?;
            if request.is_none() {
                return Err(RequestError::NotFound.into());
            }
            if store.appointments().count_for_request(id)? > 0 {
                return Err(RequestError::HasAppointments.into());
            }
            store.requests().delete(id)?;
            Ok((
                (),
                vec![EventBody::RequestDeleted {
                    request_id: id.clone(),
                }],
            ))
        })
    }
}

pub struct AppointmentsApi<'a, S: Store> {
    core: &'a Neighborly<S>,
}

impl<'a, S: Store> AppointmentsApi<'a, S> {
    /// Book an appointment for a request. At most one active appointment
    /// may exist per request; the check runs inside the transaction and a
    /// partial unique index in the store backs it up. Booking always moves
    /// the parent request to IN_PROGRESS.
    pub fn book(
        &self,
        ctx: &CallContext,
        identity: &Identity,
        input: CreateAppointmentInput,
    ) -> Result<Appointment, NeighborlyError> {
        self.core.with_events(ctx, |store| {
            let volunteer = store
                .users()
                .find_by_subject(&identity.subject)?
                .ok_or(UserError::NotFound)?;
            let request = store
                .requests()
                .get(&input.request_id)?
                .ok_or(RequestError::NotFound)?;
            let active = store.appointments().list_active_for_request(&request.id)?;
            if !active.is_empty() {
                return Err(AppointmentError::AlreadyBooked.into());
            }
            let appointment = store.appointments().create(&volunteer.id, input)?;
            let request = store
                .requests()
                .set_status(&request.id, RequestStatus::InProgress)?;
            Ok((
                appointment.clone(),
                vec![EventBody::AppointmentBooked {
                    appointment,
                    request,
                }],
            ))
        })
    }

    pub fn get(&self, id: &AppointmentId) -> Result<Option<AppointmentDetail>, NeighborlyError> {
        self.core
            .store
            .appointments()
            .get_detail(id)
            .map_err(NeighborlyError::from)
    }

    pub fn list(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<AppointmentDetail>, NeighborlyError> {
        self.core
            .store
            .appointments()
            .list(filter)
            .map_err(NeighborlyError::from)
    }

    pub fn list_mine(
        &self,
        identity: &Identity,
    ) -> Result<Vec<VolunteerAppointment>, NeighborlyError> {
        let volunteer = self
            .core
            .store
            .users()
            .find_by_subject(&identity.subject)?
            .ok_or(UserError::NotFound)?;
        self.core
            .store
            .appointments()
            .list_by_volunteer(&volunteer.id)
            .map_err(NeighborlyError::from)
    }

    /// Set an appointment's status. Cancelling the last active appointment
    /// of an IN_PROGRESS request reopens that request; other status values
    /// save with no cascade.
    pub fn set_status(
        &self,
        ctx: &CallContext,
        id: &AppointmentId,
        input: UpdateAppointmentInput,
    ) -> Result<Appointment, NeighborlyError> {
        self.core.with_events(ctx, |store| {
            let existing = store
                .appointments()
                .get(id)?
                .ok_or(AppointmentError::NotFound)?;
            let updated = store.appointments().set_status(id, input.status)?;
            let mut events = Vec::new();
            if input.status == AppointmentStatus::Cancelled {
                events.push(EventBody::AppointmentCancelled {
                    appointment: updated.clone(),
                });
                if let Some(request) = reopen_if_idle(store, &existing.request_id)? {
                    events.push(EventBody::RequestReopened { request });
                }
            } else {
                events.push(EventBody::AppointmentUpdated {
                    appointment: updated.clone(),
                    from: existing.status,
                    to: input.status,
                });
            }
            Ok((updated, events))
        })
    }

    /// Remove an appointment. Deletion runs the same reopen check as
    /// cancellation, so a request never stays IN_PROGRESS with no active
    /// appointment behind it.
    pub fn delete(&self, ctx: &CallContext, id: &AppointmentId) -> Result<(), NeighborlyError> {
        self.core.with_events(ctx, |store| {
            let existing = store
                .appointments()
                .get(id)?
                .ok_or(AppointmentError::NotFound)?;
            store.appointments().delete(id)?;
            let mut events = vec![EventBody::AppointmentDeleted {
                appointment_id: id.clone(),
            }];
            if let Some(request) = reopen_if_idle(store, &existing.request_id)? {
                events.push(EventBody::RequestReopened { request });
            }
            Ok(((), events))
        })
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a Neighborly<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, NeighborlyError> {
        self.core.store.events().list(after, limit)
    }
}

/// Revert a request to OPEN when no active appointment remains. Only an
/// IN_PROGRESS request is reverted: COMPLETED is terminal.
fn reopen_if_idle<S: Store>(
    store: &S,
    request_id: &RequestId,
) -> Result<Option<HelpRequest>, NeighborlyError> {
    let active = store.appointments().list_active_for_request(request_id)?;
    if !active.is_empty() {
        return Ok(None);
    }
    let Some(request) = store.requests().get(request_id)? else {
        return Ok(None);
    };
    if request.status != RequestStatus::InProgress {
        return Ok(None);
    }
    let reopened = store
        .requests()
        .set_status(request_id, RequestStatus::Open)?;
    Ok(Some(reopened))
}

fn build_event_record(ctx: &CallContext, body: EventBody) -> Result<EventRecord, NeighborlyError> {
    let value = serde_json::to_value(body).map_err(|err| NeighborlyError::Internal {
        message: err.to_string(),
    })?;
    Ok(EventRecord {
        id: String::new(),
        seq: 0,
        at: Utc::now(),
        correlation_id: ctx.correlation_id.clone(),
        source: ctx.source,
        body: value,
    })
}
