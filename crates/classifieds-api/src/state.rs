use std::sync::Arc;

use tracing::error;

use classifieds_db::Database;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::media::MediaStorage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: AppConfig,
    pub media: MediaStorage,
}

/// Runs blocking work (SQLite, password hashing) off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}
