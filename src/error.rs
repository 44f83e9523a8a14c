//! Error kinds returned by the application services.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Message shared by every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "The provided credentials are incorrect.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("The given data was invalid.")]
    ValidationFailed(ValidationErrors),

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn forbidden() -> Self {
        Self::Forbidden("This action is unauthorized.".to_string())
    }

    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found.", resource))
    }

    /// Whether this error is the caller's fault (never logged as a fault)
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed(errors)
    }
}

/// True when a database error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

/// Translate a racing insert's constraint failure into a domain conflict
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::Conflict(message.to_string())
    } else {
        ServiceError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(
            ServiceError::InvalidCredentials.to_string(),
            "The provided credentials are incorrect."
        );
    }

    #[test]
    fn test_expected_errors() {
        assert!(ServiceError::forbidden().is_expected());
        assert!(ServiceError::not_found("Member profile").is_expected());
        assert!(!ServiceError::Internal("boom".into()).is_expected());
        assert!(!ServiceError::Database(sqlx::Error::RowNotFound).is_expected());
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "taken");
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
