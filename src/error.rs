use thiserror::Error;

/// Domain error taxonomy shared by all services. The API layer maps each
/// variant to a distinct status code; `Internal` carries storage and other
/// plumbing failures and is reported opaquely.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

/// Domain errors raised inside repository closures travel through
/// `anyhow::Error`; unwrap them back into their variant instead of
/// flattening everything to `Internal`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => AppError::Internal(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
