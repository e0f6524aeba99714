use crate::error::NeighborlyError;
use nb_events::types::EventRecord;

pub trait EventRepository {
    /// Persist a record, assigning its id and sequence number.
    fn append(&self, event: EventRecord) -> Result<EventRecord, NeighborlyError>;
    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, NeighborlyError>;
}
