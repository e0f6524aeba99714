use crate::user_repo::user_from_row;
use crate::util::{encode_enum, from_rfc3339, is_constraint_violation, to_rfc3339};
use nb_core::error::RequestError;
use nb_core::requests::RequestRepository;
use nb_core::types::{
    CreateRequestInput, HelpRequest, RequestId, RequestStatus, RequestWithRequester,
    UpdateRequestInput, UserId,
};
use rusqlite::Connection;

pub struct RequestRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> RequestRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

const COLUMNS: &str = "id, requester_id, title, description, status, created_at, updated_at";
const JOINED: &str = "r.id, r.requester_id, r.title, r.description, r.status, r.created_at, \
                      r.updated_at, u.id, u.subject, u.name, u.email, u.created_at, u.updated_at";

impl RequestRepository for RequestRepo<'_> {
    fn create(
        &self,
        requester_id: &UserId,
        input: CreateRequestInput,
    ) -> Result<HelpRequest, RequestError> {
        let now = chrono::Utc::now();
        let request = HelpRequest {
            id: RequestId::generate(),
            requester_id: requester_id.clone(),
            title: input.title,
            description: input.description,
            status: RequestStatus::Open,
            created_at: now,
            updated_at: now,
        };
        let sql = "INSERT INTO requests (id, requester_id, title, description, status, \
                   created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
        self.conn
            .execute(
                sql,
                (
                    request.id.as_str(),
                    request.requester_id.as_str(),
                    request.title.as_str(),
                    request.description.as_str(),
                    encode_enum(&request.status).map_err(storage)?,
                    to_rfc3339(&request.created_at),
                    to_rfc3339(&request.updated_at),
                ),
            )
            .map_err(storage)?;
        Ok(request)
    }

    fn get(&self, id: &RequestId) -> Result<Option<HelpRequest>, RequestError> {
        let sql = format!("SELECT {COLUMNS} FROM requests WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(storage)?;
        let Some(row) = rows.next().map_err(storage)? else {
            return Ok(None);
        };
        request_from_row(row, 0)
            .map(Some)
            .map_err(|message| RequestError::Storage { message })
    }

    fn get_with_requester(
        &self,
        id: &RequestId,
    ) -> Result<Option<RequestWithRequester>, RequestError> {
        let sql = format!(
            "SELECT {JOINED} FROM requests r JOIN users u ON u.id = r.requester_id \
             WHERE r.id = ?1"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(storage)?;
        let Some(row) = rows.next().map_err(storage)? else {
            return Ok(None);
        };
        joined_from_row(row)
            .map(Some)
            .map_err(|message| RequestError::Storage { message })
    }

    fn list(&self) -> Result<Vec<RequestWithRequester>, RequestError> {
        let sql = format!(
            "SELECT {JOINED} FROM requests r JOIN users u ON u.id = r.requester_id \
             ORDER BY r.created_at DESC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([]).map_err(storage)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            out.push(joined_from_row(row).map_err(|message| RequestError::Storage { message })?);
        }
        Ok(out)
    }

    fn list_by_requester(&self, requester_id: &UserId) -> Result<Vec<HelpRequest>, RequestError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM requests WHERE requester_id = ?1 ORDER BY created_at DESC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([requester_id.as_str()]).map_err(storage)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            out.push(
                request_from_row(row, 0).map_err(|message| RequestError::Storage { message })?,
            );
        }
        Ok(out)
    }

    fn update(
        &self,
        id: &RequestId,
        input: UpdateRequestInput,
    ) -> Result<HelpRequest, RequestError> {
        let mut request = self.get(id)?.ok_or(RequestError::NotFound)?;
        if let Some(title) = input.title {
            request.title = title;
        }
        if let Some(description) = input.description {
            request.description = description;
        }
        if let Some(status) = input.status {
            request.status = status;
        }
        request.updated_at = chrono::Utc::now();
        let sql = "UPDATE requests SET title = ?1, description = ?2, status = ?3, \
                   updated_at = ?4 WHERE id = ?5";
        self.conn
            .execute(
                sql,
                (
                    request.title.as_str(),
                    request.description.as_str(),
                    encode_enum(&request.status).map_err(storage)?,
                    to_rfc3339(&request.updated_at),
                    request.id.as_str(),
                ),
            )
            .map_err(storage)?;
        Ok(request)
    }

    fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<HelpRequest, RequestError> {
        let mut request = self.get(id)?.ok_or(RequestError::NotFound)?;
        request.status = status;
        request.updated_at = chrono::Utc::now();
        let sql = "UPDATE requests SET status = ?1, updated_at = ?2 WHERE id = ?3";
        self.conn
            .execute(
                sql,
                (
                    encode_enum(&request.status).map_err(storage)?,
                    to_rfc3339(&request.updated_at),
                    request.id.as_str(),
                ),
            )
            .map_err(storage)?;
        Ok(request)
    }

    fn delete(&self, id: &RequestId) -> Result<(), RequestError> {
        let affected = self
            .conn
            .execute("DELETE FROM requests WHERE id = ?1", [id.as_str()])
            .map_err(|err| {
                // ON DELETE RESTRICT fires when the service-level check
                // raced with a concurrent booking.
                if is_constraint_violation(&err) {
                    RequestError::HasAppointments
                } else {
                    storage(err)
                }
            })?;
        if affected == 0 {
            return Err(RequestError::NotFound);
        }
        Ok(())
    }
}

/// Map the seven request columns starting at `base`.
pub(crate) fn request_from_row(
    row: &rusqlite::Row<'_>,
    base: usize,
) -> Result<HelpRequest, String> {
    let id: String = row.get(base).map_err(text)?;
    let requester_id: String = row.get(base + 1).map_err(text)?;
    let title: String = row.get(base + 2).map_err(text)?;
    let description: String = row.get(base + 3).map_err(text)?;
    let status: String = row.get(base + 4).map_err(text)?;
    let created_at: String = row.get(base + 5).map_err(text)?;
    let updated_at: String = row.get(base + 6).map_err(text)?;
    Ok(HelpRequest {
        id: RequestId::new(id).map_err(text)?,
        requester_id: UserId::new(requester_id).map_err(text)?,
        title,
        description,
        status: crate::util::decode_enum(&status).map_err(text)?,
        created_at: from_rfc3339(&created_at).map_err(text)?,
        updated_at: from_rfc3339(&updated_at).map_err(text)?,
    })
}

fn joined_from_row(row: &rusqlite::Row<'_>) -> Result<RequestWithRequester, String> {
    Ok(RequestWithRequester {
        request: request_from_row(row, 0)?,
        requester: user_from_row(row, 7)?,
    })
}

fn text(err: impl std::fmt::Display) -> String {
    err.to_string()
}

fn storage<E: std::fmt::Display>(err: E) -> RequestError {
    RequestError::Storage {
        message: err.to_string(),
    }
}
