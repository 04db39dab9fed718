use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use classifieds_db::DbError;
use classifieds_types::errors::{ErrorResponse, FieldErrors};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// A 422 carrying a single message for `field`.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => Self::NotFound(format!("{} {} not found", entity, id)),
            DbError::Validation(errors) => Self::Validation(errors),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                warn!("Rejected invalid fields: {}", errors.fields().collect::<Vec<_>>().join(", "));
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message })).into_response()
            }
            Self::BadRequest(message) => {
                warn!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
            }
            Self::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse {
                    error: format!("upload exceeds the {} byte limit", limit),
                }),
            )
                .into_response(),
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "internal server error".into(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
