use crate::request_repo::request_from_row;
use crate::user_repo::user_from_row;
use crate::util::{encode_enum, from_rfc3339, to_rfc3339};
use nb_core::appointments::AppointmentRepository;
use nb_core::error::AppointmentError;
use nb_core::types::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentId, AppointmentStatus,
    CreateAppointmentInput, RequestId, RequestWithRequester, UserId, VolunteerAppointment,
};
use rusqlite::Connection;

pub struct AppointmentRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> AppointmentRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

const COLUMNS: &str =
    "id, request_id, volunteer_id, scheduled_at, status, created_at, updated_at";
const PREFIXED: &str = "a.id, a.request_id, a.volunteer_id, a.scheduled_at, a.status, \
                        a.created_at, a.updated_at";
const REQUEST_COLS: &str = "r.id, r.requester_id, r.title, r.description, r.status, \
                            r.created_at, r.updated_at";
const USER_COLS: &str = "u.id, u.subject, u.name, u.email, u.created_at, u.updated_at";

impl AppointmentRepository for AppointmentRepo<'_> {
    fn create(
        &self,
        volunteer_id: &UserId,
        input: CreateAppointmentInput,
    ) -> Result<Appointment, AppointmentError> {
        let now = chrono::Utc::now();
        let appointment = Appointment {
            id: AppointmentId::generate(),
            request_id: input.request_id,
            volunteer_id: volunteer_id.clone(),
            scheduled_at: input.scheduled_at,
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        let sql = "INSERT INTO appointments (id, request_id, volunteer_id, scheduled_at, \
                   status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
        self.conn
            .execute(
                sql,
                (
                    appointment.id.as_str(),
                    appointment.request_id.as_str(),
                    appointment.volunteer_id.as_str(),
                    to_rfc3339(&appointment.scheduled_at),
                    encode_enum(&appointment.status).map_err(storage)?,
                    to_rfc3339(&appointment.created_at),
                    to_rfc3339(&appointment.updated_at),
                ),
            )
            .map_err(map_insert_err)?;
        Ok(appointment)
    }

    fn get(&self, id: &AppointmentId) -> Result<Option<Appointment>, AppointmentError> {
        let sql = format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(storage)?;
        let Some(row) = rows.next().map_err(storage)? else {
            return Ok(None);
        };
        appointment_from_row(row, 0)
            .map(Some)
            .map_err(|message| AppointmentError::Storage { message })
    }

    fn get_detail(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<AppointmentDetail>, AppointmentError> {
        let sql = format!(
            "SELECT {PREFIXED}, {REQUEST_COLS}, {USER_COLS} FROM appointments a \
             JOIN requests r ON r.id = a.request_id \
             JOIN users u ON u.id = a.volunteer_id \
             WHERE a.id = ?1"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(storage)?;
        let Some(row) = rows.next().map_err(storage)? else {
            return Ok(None);
        };
        detail_from_row(row)
            .map(Some)
            .map_err(|message| AppointmentError::Storage { message })
    }

    fn list(&self, filter: AppointmentFilter) -> Result<Vec<AppointmentDetail>, AppointmentError> {
        let mut sql = format!(
            "SELECT {PREFIXED}, {REQUEST_COLS}, {USER_COLS} FROM appointments a \
             JOIN requests r ON r.id = a.request_id \
             JOIN users u ON u.id = a.volunteer_id"
        );
        if filter.request_id.is_some() {
            sql.push_str(" WHERE a.request_id = ?1");
        }
        sql.push_str(" ORDER BY a.created_at DESC");
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = match &filter.request_id {
            Some(request_id) => stmt.query([request_id.as_str()]).map_err(storage)?,
            None => stmt.query([]).map_err(storage)?,
        };
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            out.push(detail_from_row(row).map_err(|message| AppointmentError::Storage {
                message,
            })?);
        }
        Ok(out)
    }

    fn list_by_volunteer(
        &self,
        volunteer_id: &UserId,
    ) -> Result<Vec<VolunteerAppointment>, AppointmentError> {
        let sql = format!(
            "SELECT {PREFIXED}, {REQUEST_COLS}, {USER_COLS} FROM appointments a \
             JOIN requests r ON r.id = a.request_id \
             JOIN users u ON u.id = r.requester_id \
             WHERE a.volunteer_id = ?1 ORDER BY a.created_at DESC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([volunteer_id.as_str()]).map_err(storage)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            let booking = booking_from_row(row)
                .map_err(|message| AppointmentError::Storage { message })?;
            out.push(booking);
        }
        Ok(out)
    }

    fn list_active_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM appointments WHERE request_id = ?1 AND status != ?2"
        );
        let cancelled = encode_enum(&AppointmentStatus::Cancelled).map_err(storage)?;
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt
            .query((request_id.as_str(), cancelled.as_str()))
            .map_err(storage)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            out.push(appointment_from_row(row, 0).map_err(|message| {
                AppointmentError::Storage { message }
            })?);
        }
        Ok(out)
    }

    fn count_for_request(&self, request_id: &RequestId) -> Result<u64, AppointmentError> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM appointments WHERE request_id = ?1")
            .map_err(storage)?;
        let count: i64 = stmt
            .query_row([request_id.as_str()], |row| row.get(0))
            .map_err(storage)?;
        Ok(count.max(0).unsigned_abs())
    }

    fn set_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.get(id)?.ok_or(AppointmentError::NotFound)?;
        appointment.status = status;
        appointment.updated_at = chrono::Utc::now();
        let sql = "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3";
        self.conn
            .execute(
                sql,
                (
                    encode_enum(&appointment.status).map_err(storage)?,
                    to_rfc3339(&appointment.updated_at),
                    appointment.id.as_str(),
                ),
            )
            .map_err(storage)?;
        Ok(appointment)
    }

    fn complete_all_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let now = chrono::Utc::now();
        let sql = "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE request_id = ?3";
        self.conn
            .execute(
                sql,
                (
                    encode_enum(&AppointmentStatus::Completed).map_err(storage)?,
                    to_rfc3339(&now),
                    request_id.as_str(),
                ),
            )
            .map_err(storage)?;
        let sql = format!("SELECT {COLUMNS} FROM appointments WHERE request_id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query([request_id.as_str()]).map_err(storage)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            out.push(appointment_from_row(row, 0).map_err(|message| {
                AppointmentError::Storage { message }
            })?);
        }
        Ok(out)
    }

    fn delete(&self, id: &AppointmentId) -> Result<(), AppointmentError> {
        let affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?1", [id.as_str()])
            .map_err(storage)?;
        if affected == 0 {
            return Err(AppointmentError::NotFound);
        }
        Ok(())
    }
}

/// Map the seven appointment columns starting at `base`.
fn appointment_from_row(row: &rusqlite::Row<'_>, base: usize) -> Result<Appointment, String> {
    let id: String = row.get(base).map_err(text)?;
    let request_id: String = row.get(base + 1).map_err(text)?;
    let volunteer_id: String = row.get(base + 2).map_err(text)?;
    let scheduled_at: String = row.get(base + 3).map_err(text)?;
    let status: String = row.get(base + 4).map_err(text)?;
    let created_at: String = row.get(base + 5).map_err(text)?;
    let updated_at: String = row.get(base + 6).map_err(text)?;
    Ok(Appointment {
        id: AppointmentId::new(id).map_err(text)?,
        request_id: RequestId::new(request_id).map_err(text)?,
        volunteer_id: UserId::new(volunteer_id).map_err(text)?,
        scheduled_at: from_rfc3339(&scheduled_at).map_err(text)?,
        status: crate::util::decode_enum(&status).map_err(text)?,
        created_at: from_rfc3339(&created_at).map_err(text)?,
        updated_at: from_rfc3339(&updated_at).map_err(text)?,
    })
}

fn detail_from_row(row: &rusqlite::Row<'_>) -> Result<AppointmentDetail, String> {
    Ok(AppointmentDetail {
        appointment: appointment_from_row(row, 0)?,
        request: request_from_row(row, 7)?,
        volunteer: user_from_row(row, 14)?,
    })
}

fn booking_from_row(row: &rusqlite::Row<'_>) -> Result<VolunteerAppointment, String> {
    Ok(VolunteerAppointment {
        appointment: appointment_from_row(row, 0)?,
        request: RequestWithRequester {
            request: request_from_row(row, 7)?,
            requester: user_from_row(row, 14)?,
        },
    })
}

fn map_insert_err(err: rusqlite::Error) -> AppointmentError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        // The partial unique index on scheduled appointments turns a lost
        // booking race into a constraint failure instead of a double book.
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return AppointmentError::AlreadyBooked;
        }
    }
    storage(err)
}

fn text(err: impl std::fmt::Display) -> String {
    err.to_string()
}

fn storage<E: std::fmt::Display>(err: E) -> AppointmentError {
    AppointmentError::Storage {
        message: err.to_string(),
    }
}
