use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339};
use nb_core::error::NeighborlyError;
use nb_core::events::EventRepository;
use nb_events::types::EventRecord;
use rusqlite::Connection;
use ulid::Ulid;

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for EventRepo<'_> {
    fn append(&self, mut event: EventRecord) -> Result<EventRecord, NeighborlyError> {
        event.seq = next_seq(self.conn)?;
        event.id = format!("evt_{}", Ulid::new());
        let sql = "INSERT INTO events (id, seq, at, correlation_id, source, body_json) \
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        self.conn
            .execute(
                sql,
                (
                    event.id.as_str(),
                    event.seq,
                    to_rfc3339(&event.at),
                    event.correlation_id.as_deref(),
                    encode_enum(&event.source).map_err(internal)?,
                    encode_json(&event.body).map_err(internal)?,
                ),
            )
            .map_err(internal)?;
        Ok(event)
    }

    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, NeighborlyError> {
        let mut sql =
            String::from("SELECT id, seq, at, correlation_id, source, body_json FROM events");
        let after_param;
        let limit_param;
        let mut params: Vec<&dyn rusqlite::types::ToSql> = Vec::new();
        if let Some(after) = after {
            after_param = after;
            sql.push_str(" WHERE seq > ?");
            params.push(&after_param);
        }
        sql.push_str(" ORDER BY seq ASC");
        if let Some(limit) = limit {
            limit_param = i64::from(limit);
            sql.push_str(" LIMIT ?");
            params.push(&limit_param);
        }

        let mut stmt = self.conn.prepare(&sql).map_err(internal)?;
        let mut rows = stmt.query(&params[..]).map_err(internal)?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().map_err(internal)? {
            events.push(record_from_row(row)?);
        }
        Ok(events)
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<EventRecord, NeighborlyError> {
    let id: String = row.get(0).map_err(internal)?;
    let seq: i64 = row.get(1).map_err(internal)?;
    let at: String = row.get(2).map_err(internal)?;
    let correlation_id: Option<String> = row.get(3).map_err(internal)?;
    let source: String = row.get(4).map_err(internal)?;
    let body_json: String = row.get(5).map_err(internal)?;
    Ok(EventRecord {
        id,
        seq,
        at: from_rfc3339(&at).map_err(internal)?,
        correlation_id,
        source: decode_enum(&source).map_err(internal)?,
        body: decode_json(&body_json).map_err(internal)?,
    })
}

fn next_seq(conn: &Connection) -> Result<i64, NeighborlyError> {
    conn.query_row("SELECT COALESCE(MAX(seq), 0) FROM events", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|seq| seq + 1)
    .map_err(internal)
}

fn internal<E: std::fmt::Display>(err: E) -> NeighborlyError {
    NeighborlyError::Internal {
        message: err.to_string(),
    }
}
