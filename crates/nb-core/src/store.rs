use crate::appointments::AppointmentRepository;
use crate::events::EventRepository;
use crate::requests::RequestRepository;
use crate::users::UserRepository;
use crate::NeighborlyError;

/// Persistence port. Constructed explicitly and passed into the service
/// layer; there is no process-wide store handle.
pub trait Store {
    type Users<'a>: UserRepository
    where
        Self: 'a;
    type Requests<'a>: RequestRepository
    where
        Self: 'a;
    type Appointments<'a>: AppointmentRepository
    where
        Self: 'a;
    type Events<'a>: EventRepository
    where
        Self: 'a;

    fn users(&self) -> Self::Users<'_>;
    fn requests(&self) -> Self::Requests<'_>;
    fn appointments(&self) -> Self::Appointments<'_>;
    fn events(&self) -> Self::Events<'_>;

    /// Run `f` inside a single transaction. Every multi-write rule in the
    /// service layer (booking, cascades, lazy user creation) relies on this
    /// for atomicity.
    fn with_tx<F, T>(&self, f: F) -> Result<T, NeighborlyError>
    where
        F: FnOnce(&Self) -> Result<T, NeighborlyError>;
}
