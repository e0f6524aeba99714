use crate::types::EventRecord;
use tokio::sync::broadcast;

/// In-process fanout for committed events. Slow subscribers that fall more
/// than `capacity` events behind miss the overwritten ones and should
/// re-sync from the event log.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventRecord>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    /// Send to all current subscribers. A send with no subscribers is not
    /// an error worth surfacing, so the result only reports that case.
    pub fn publish(
        &self,
        event: EventRecord,
    ) -> Result<(), broadcast::error::SendError<EventRecord>> {
        self.sender.send(event).map(|_| ())
    }
}
