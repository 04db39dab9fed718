use classifieds_types::errors::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("DB lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<FieldErrors> for DbError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
