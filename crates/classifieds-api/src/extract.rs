use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use tracing::debug;

use crate::error::ApiError;

/// Numeric `{id}` path segment. Anything that is not an integer id matches
/// no resource, so it is a 404 rather than a 400.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub i64);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                debug!("Unmatched id in {}: {}", parts.uri.path(), rejection.body_text());
                Err(ApiError::NotFound(format!("No resource at {}", parts.uri.path())))
            }
        }
    }
}
