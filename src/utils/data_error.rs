// Unified error type for the data-access layer
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

/// Errors surfaced by repositories and raw query helpers.
///
/// "find" style lookups return `Ok(None)` for missing rows; the "get" style
/// variants surface `DataError::NotFound` instead.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violation: {0}")]
    Conflict(String),

    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<diesel::result::Error> for DataError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => DataError::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DataError::Conflict(
                    info.constraint_name()
                        .unwrap_or("unique constraint")
                        .to_string(),
                )
            },
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => DataError::ForeignKeyViolation(
                info.constraint_name()
                    .unwrap_or("foreign key constraint")
                    .to_string(),
            ),
            _ => DataError::Database(error.to_string()),
        }
    }
}

impl<E: std::error::Error + 'static> From<bb8::RunError<E>> for DataError {
    fn from(error: bb8::RunError<E>) -> Self {
        DataError::Pool(error.to_string())
    }
}

impl From<validator::ValidationErrors> for DataError {
    fn from(error: validator::ValidationErrors) -> Self {
        DataError::Validation(error.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for DataError {
    fn from(error: crate::utils::password::PasswordError) -> Self {
        DataError::Validation(error.to_string())
    }
}

/// Convenience alias used across repositories
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err: DataError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, DataError::NotFound));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            DataError::Conflict("users_email_key".to_string()).to_string(),
            "Unique constraint violation: users_email_key"
        );
        assert_eq!(DataError::NotFound.to_string(), "Record not found");
    }
}
