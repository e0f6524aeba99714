use crate::error::UserError;
use crate::types::{Identity, UpdateUserInput, User, UserId};

pub trait UserRepository {
    /// Insert a new user for a verified identity. The caller is expected to
    /// have checked for an existing row inside the same transaction; the
    /// unique constraint on `subject` is the backstop.
    fn create(&self, identity: &Identity) -> Result<User, UserError>;
    fn get(&self, id: &UserId) -> Result<Option<User>, UserError>;
    fn find_by_subject(&self, subject: &str) -> Result<Option<User>, UserError>;
    fn update(&self, id: &UserId, input: UpdateUserInput) -> Result<User, UserError>;
}
