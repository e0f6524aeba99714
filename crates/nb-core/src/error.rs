use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request not found")]
    NotFound,
    #[error("request has appointments")]
    HasAppointments,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("appointment not found")]
    NotFound,
    #[error("an active appointment already exists for this request")]
    AlreadyBooked,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Error)]
pub enum NeighborlyError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Appointment(#[from] AppointmentError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
