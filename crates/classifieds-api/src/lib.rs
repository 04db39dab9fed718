pub mod ads;
pub mod body;
pub mod categories;
pub mod config;
pub mod error;
pub mod extract;
pub mod listing;
pub mod locations;
pub mod media;
pub mod routes;
pub mod state;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
