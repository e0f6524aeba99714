use crate::util::{from_rfc3339, to_rfc3339};
use nb_core::error::UserError;
use nb_core::types::{Identity, UpdateUserInput, User, UserId};
use nb_core::users::UserRepository;
use rusqlite::Connection;

pub struct UserRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> UserRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

const COLUMNS: &str = "id, subject, name, email, created_at, updated_at";

impl UserRepository for UserRepo<'_> {
    fn create(&self, identity: &Identity) -> Result<User, UserError> {
        let now = chrono::Utc::now();
        let user = User {
            id: UserId::generate(),
            subject: identity.subject.clone(),
            name: identity.name.clone().unwrap_or_default(),
            email: identity.email.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let sql = "INSERT INTO users (id, subject, name, email, created_at, updated_at) \
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        self.conn
            .execute(
                sql,
                (
                    user.id.as_str(),
                    user.subject.as_str(),
                    user.name.as_str(),
                    user.email.as_str(),
                    to_rfc3339(&user.created_at),
                    to_rfc3339(&user.updated_at),
                ),
            )
            .map_err(storage)?;
        Ok(user)
    }

    fn get(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
        fetch_optional(self.conn, &sql, id.as_str())
    }

    fn find_by_subject(&self, subject: &str) -> Result<Option<User>, UserError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE subject = ?1");
        fetch_optional(self.conn, &sql, subject)
    }

    fn update(&self, id: &UserId, input: UpdateUserInput) -> Result<User, UserError> {
        let mut user = self.get(id)?.ok_or(UserError::NotFound)?;
        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(email) = input.email {
            user.email = email;
        }
        user.updated_at = chrono::Utc::now();
        let sql = "UPDATE users SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4";
        self.conn
            .execute(
                sql,
                (
                    user.name.as_str(),
                    user.email.as_str(),
                    to_rfc3339(&user.updated_at),
                    user.id.as_str(),
                ),
            )
            .map_err(storage)?;
        Ok(user)
    }
}

fn fetch_optional(conn: &Connection, sql: &str, param: &str) -> Result<Option<User>, UserError> {
    let mut stmt = conn.prepare(sql).map_err(storage)?;
    let mut rows = stmt.query([param]).map_err(storage)?;
    let Some(row) = rows.next().map_err(storage)? else {
        return Ok(None);
    };
    user_from_row(row, 0)
        .map(Some)
        .map_err(|message| UserError::Storage { message })
}

/// Map the six user columns starting at `base`. Shared with the joining
/// queries in the request and appointment repos.
pub(crate) fn user_from_row(row: &rusqlite::Row<'_>, base: usize) -> Result<User, String> {
    let id: String = row.get(base).map_err(text)?;
    let subject: String = row.get(base + 1).map_err(text)?;
    let name: String = row.get(base + 2).map_err(text)?;
    let email: String = row.get(base + 3).map_err(text)?;
    let created_at: String = row.get(base + 4).map_err(text)?;
    let updated_at: String = row.get(base + 5).map_err(text)?;
    Ok(User {
        id: UserId::new(id).map_err(text)?,
        subject,
        name,
        email,
        created_at: from_rfc3339(&created_at).map_err(text)?,
        updated_at: from_rfc3339(&updated_at).map_err(text)?,
    })
}

fn text(err: impl std::fmt::Display) -> String {
    err.to_string()
}

fn storage(err: rusqlite::Error) -> UserError {
    UserError::Storage {
        message: err.to_string(),
    }
}
